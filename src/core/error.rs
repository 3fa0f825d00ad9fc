use thiserror::Error;

use crate::download::error::DownloadError;

/// Centralized error types for the application
///
/// Adapters and handlers convert their failures into this enum so the handler
/// boundary can log them uniformly and turn them into a generic chat message.
///
/// # Example
///
/// ```no_run
/// use melodora::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Download/transcode errors
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    /// HTTP/Fetch errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding errors (yt-dlp output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Short category label used for the error metrics
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Telegram(_) => "telegram",
            AppError::Download(e) => e.subcategory(),
            AppError::Http(_) => "http",
            AppError::Io(_) => "io",
            AppError::Json(_) => "json",
            AppError::Url(_) => "url",
            AppError::Config(_) => "config",
            AppError::Validation(_) => "validation",
        }
    }
}
