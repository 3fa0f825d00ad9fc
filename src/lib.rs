//! Melodora - Telegram bot that finds music by free-text query and sends it as MP3
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, metrics, usage statistics, keep-alive server
//! - `storage`: Per-user search sessions
//! - `download`: Search/download backends (demo catalog, yt-dlp + ffmpeg) and temp-file hygiene
//! - `telegram`: Bot setup, callback codec, interaction controller and dispatcher schema

pub mod cli;
pub mod core;
pub mod download;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError};
pub use download::source::{AudioPayload, AudioQuality, DownloadAdapter, SearchAdapter, TrackCandidate};
pub use storage::SessionStore;
pub use telegram::{schema, Controller};
