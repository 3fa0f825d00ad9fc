//! Core utilities: configuration, errors, logging, metrics and shared state

pub mod config;
pub mod error;
pub mod keep_alive;
pub mod logging;
pub mod metrics;
pub mod process;
pub mod stats;
pub mod utils;

pub use error::{AppError, AppResult};
pub use logging::init_logger;
pub use stats::{Stats, StatsReport};
