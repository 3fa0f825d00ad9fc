//! Telegram bot integration and handlers

pub mod bot;
pub mod callback;
pub mod controller;
pub mod handlers;
pub mod render;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use callback::CallbackAction;
pub use controller::{
    AudioSink, BrowseOutcome, ChatUser, Controller, DownloadOutcome, MoreOutcome, SearchOutcome, SelectOutcome,
    StatsOutcome,
};
pub use handlers::{schema, HandlerDeps, HandlerError};
