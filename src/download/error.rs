use std::fmt;

/// Structured error type for search and download operations.
///
/// Adapters never surface these to the user directly; they are logged and
/// recorded as metrics before the adapter answers with an empty result.
#[derive(Debug)]
pub enum DownloadError {
    /// yt-dlp specific failures (binary not found, bad exit code, etc.)
    YtDlp(String),
    /// FFmpeg transcoding failures
    Ffmpeg(String),
    /// Expected file not found after processing
    FileNotFound(String),
    /// External process timed out
    Timeout(String),
    /// Media host refused or failed the request
    Http(String),
    /// Catch-all for uncategorized errors
    Other(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// Returns subcategory for metrics
    pub fn subcategory(&self) -> &'static str {
        match self {
            DownloadError::YtDlp(_) => "ytdlp",
            DownloadError::Ffmpeg(_) => "ffmpeg",
            DownloadError::FileNotFound(_) => "file_not_found",
            DownloadError::Timeout(_) => "timeout",
            DownloadError::Http(_) => "http",
            DownloadError::Other(_) => "other",
        }
    }

    /// Returns the inner message
    pub fn message(&self) -> &str {
        match self {
            DownloadError::YtDlp(msg)
            | DownloadError::Ffmpeg(msg)
            | DownloadError::FileNotFound(msg)
            | DownloadError::Timeout(msg)
            | DownloadError::Http(msg)
            | DownloadError::Other(msg) => msg,
        }
    }
}
