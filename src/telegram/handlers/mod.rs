//! Telegram bot handler tree configuration
//!
//! Handlers translate updates into `Controller` calls and render the outcomes.
//! The same schema is used by the polling dispatcher in `main`.

mod callbacks;
mod commands;
mod schema;
mod sink;
mod types;

pub use schema::schema;
pub use sink::TelegramAudioSink;
pub use types::{report_failure, requester_from_message, HandlerDeps, HandlerError};
