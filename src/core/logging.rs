//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - External tool diagnostics (yt-dlp / ffmpeg) logged at startup

use anyhow::Result;
use simplelog::*;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::core::config;

/// Parses a textual level, falling back to `Info` for anything unknown
pub fn parse_level(raw: &str) -> LevelFilter {
    LevelFilter::from_str(raw.trim()).unwrap_or(LevelFilter::Info)
}

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file (appended to)
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to open the file or a logger is already installed
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let level = parse_level(&config::LOG_LEVEL);
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file_path, e))?;

    let log_config = ConfigBuilder::new()
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(level, log_config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, log_config, log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which backend and external tools the bot is going to use
pub fn log_backend_configuration() {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🎵 Music backend: {}", config::MUSIC_BACKEND.as_str());
    if config::MUSIC_BACKEND.as_str() == "demo" {
        log::info!("   Demo media base URL: {}", config::DEMO_MEDIA_BASE_URL.as_str());
    } else {
        log::info!("   yt-dlp binary: {}", config::YTDL_BIN.as_str());
        log::info!("   ffmpeg binary: {}", config::FFMPEG_BIN.as_str());
        log::info!("   Temp files: {}", config::TEMP_FILES_DIR.as_str());
    }
    match *config::admin::ADMIN_USER_ID {
        Some(admin_id) => log::info!("👤 Admin ID: {}", admin_id),
        None => log::warn!("⚠️  ADMIN_USER_ID not set - /stats is disabled for everyone"),
    }
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
