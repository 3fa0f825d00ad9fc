use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

// Configuration for the bot. Every value is read once from the environment
// (optionally populated from `.env` by `main`) and cached for the process lifetime.

/// Bot token
/// Read from BOT_TOKEN, TELEGRAM_TOKEN or TELOXIDE_TOKEN environment variable
/// Empty when none is set; `run` refuses to start in that case
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELEGRAM_TOKEN"))
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .map(|token| token.trim().to_string())
        .unwrap_or_default()
});

/// Custom Bot API server URL (local telegram-bot-api)
pub static BOT_API_URL: Lazy<Option<String>> = Lazy::new(|| non_empty_var("BOT_API_URL"));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: app.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string()));

/// Log level (error, warn, info, debug, trace)
/// Default: info
pub static LOG_LEVEL: Lazy<String> = Lazy::new(|| env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()));

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// ffmpeg binary path
/// Read from FFMPEG_BIN environment variable or defaults to "ffmpeg"
pub static FFMPEG_BIN: Lazy<String> = Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// ffprobe binary path (duration probing of transcoded files)
/// Read from FFPROBE_BIN environment variable or defaults to "ffprobe"
pub static FFPROBE_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()));

/// Temporary files root for transcoding scratch directories
/// Read from TEMP_FILES_DIR environment variable, supports tilde (~) expansion
/// Default: <system temp>/melodora
pub static TEMP_FILES_DIR: Lazy<String> = Lazy::new(|| match env::var("TEMP_FILES_DIR") {
    Ok(dir) => shellexpand::tilde(&dir).into_owned(),
    Err(_) => env::temp_dir().join("melodora").to_string_lossy().into_owned(),
});

/// Search/download backend selection
/// Read from MUSIC_BACKEND environment variable: "ytdlp" (default) or "demo"
pub static MUSIC_BACKEND: Lazy<String> = Lazy::new(|| {
    env::var("MUSIC_BACKEND")
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_else(|_| "ytdlp".to_string())
});

/// Base URL the demo backend fetches its pre-hosted MP3 files from
pub static DEMO_MEDIA_BASE_URL: Lazy<String> = Lazy::new(|| {
    env::var("DEMO_MEDIA_BASE_URL").unwrap_or_else(|_| "https://files.catbox.moe/".to_string())
});

/// Default audio quality used by the plain "Download MP3" button
/// Read from DEFAULT_QUALITY environment variable: low, medium or high (default)
pub static DEFAULT_QUALITY: Lazy<String> =
    Lazy::new(|| env::var("DEFAULT_QUALITY").unwrap_or_else(|_| "high".to_string()));

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parsed_var<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Search configuration
pub mod search {
    use once_cell::sync::Lazy;

    /// Queries shorter than this (in characters, after trimming) are rejected
    pub const MIN_QUERY_CHARS: usize = 2;

    /// Maximum length of a button label before truncation
    pub const TITLE_LABEL_MAX_CHARS: usize = 35;

    /// Number of candidates requested from the search backend per query
    /// Read from SEARCH_LIMIT environment variable
    /// Default: 5
    pub static LIMIT: Lazy<usize> = Lazy::new(|| super::parsed_var("SEARCH_LIMIT", 5));

    /// Maximum number of candidates rendered as buttons ("more tracks" also uses it as limit)
    /// Read from SEARCH_DISPLAY_CAP environment variable
    /// Default: 10
    pub static DISPLAY_CAP: Lazy<usize> = Lazy::new(|| super::parsed_var("SEARCH_DISPLAY_CAP", 10));
}

/// Session store configuration
pub mod session {
    use super::Duration;
    use once_cell::sync::Lazy;

    /// Lifetime of a search session since it was last written
    /// Read from SESSION_TTL_SECS environment variable
    /// Default: 3600 (1 hour)
    pub static TTL_SECS: Lazy<u64> = Lazy::new(|| super::parsed_var("SESSION_TTL_SECS", 3600));

    /// Interval between purges of expired sessions (in seconds)
    pub const PURGE_INTERVAL_SECS: u64 = 300;

    pub fn ttl() -> Duration {
        Duration::from_secs(*TTL_SECS)
    }

    pub fn purge_interval() -> Duration {
        Duration::from_secs(PURGE_INTERVAL_SECS)
    }
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp commands (in seconds)
    pub const YTDLP_TIMEOUT_SECS: u64 = 240;

    /// Timeout for ffmpeg transcoding (in seconds)
    pub const FFMPEG_TIMEOUT_SECS: u64 = 120;

    /// Maximum length of the title part of the sent file name
    pub const FILENAME_TITLE_MAX_CHARS: usize = 30;

    pub fn ytdlp_timeout() -> Duration {
        Duration::from_secs(YTDLP_TIMEOUT_SECS)
    }

    pub fn ffmpeg_timeout() -> Duration {
        Duration::from_secs(FFMPEG_TIMEOUT_SECS)
    }
}

/// Temp-file sweep configuration
pub mod cleanup {
    use super::Duration;
    use once_cell::sync::Lazy;

    /// Artifacts older than this are removed by the background sweep
    /// Read from TEMP_RETENTION_SECS environment variable
    /// Default: 3600 (1 hour)
    pub static RETENTION_SECS: Lazy<u64> = Lazy::new(|| super::parsed_var("TEMP_RETENTION_SECS", 3600));

    /// Interval between sweeps (in seconds)
    pub const SWEEP_INTERVAL_SECS: u64 = 600;

    pub fn retention() -> Duration {
        Duration::from_secs(*RETENTION_SECS)
    }

    pub fn sweep_interval() -> Duration {
        Duration::from_secs(SWEEP_INTERVAL_SECS)
    }
}

/// Keep-alive HTTP endpoint configuration
pub mod keep_alive {
    use super::Duration;
    use once_cell::sync::Lazy;

    /// Port for the liveness server; the server is disabled when unset
    /// Read from KEEP_ALIVE_PORT (or PORT, as set by most free hosting tiers)
    pub static PORT: Lazy<Option<u16>> = Lazy::new(|| {
        super::non_empty_var("KEEP_ALIVE_PORT")
            .or_else(|| super::non_empty_var("PORT"))
            .and_then(|v| v.parse().ok())
    });

    /// Public URL the process pings to keep the host from idling
    /// Read from SELF_PING_URL environment variable
    pub static SELF_PING_URL: Lazy<Option<String>> = Lazy::new(|| super::non_empty_var("SELF_PING_URL"));

    /// Interval between self-pings (in seconds)
    pub const SELF_PING_INTERVAL_SECS: u64 = 300;

    pub fn self_ping_interval() -> Duration {
        Duration::from_secs(SELF_PING_INTERVAL_SECS)
    }
}

/// Admin configuration
pub mod admin {
    use once_cell::sync::Lazy;
    use std::env;

    /// Administrator user ID allowed to read /stats
    /// Read from ADMIN_USER_ID or ADMIN_ID environment variable
    /// None when unset (nobody can read /stats)
    pub static ADMIN_USER_ID: Lazy<Option<u64>> = Lazy::new(|| {
        env::var("ADMIN_USER_ID")
            .or_else(|_| env::var("ADMIN_ID"))
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|id| *id != 0)
    });
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Bot API requests (in seconds)
    /// Large because audio uploads go through the same client
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Timeout for fetching demo media files (in seconds)
    pub const MEDIA_FETCH_TIMEOUT_SECS: u64 = 120;

    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn media_fetch_timeout() -> Duration {
        Duration::from_secs(MEDIA_FETCH_TIMEOUT_SECS)
    }
}
