//! Search and download backend abstraction layer.
//!
//! Two traits split the backend surface: `SearchAdapter` turns a free-text
//! query into track candidates, `DownloadAdapter` turns a track id into an
//! MP3 payload. Neither surfaces errors: failures are logged, counted and
//! answered with an empty list or `None`.
//!
//! Built-in backends:
//! - `DemoSource` - fixed catalog, pre-hosted MP3 files fetched over HTTP
//! - `YtDlpSource` - YouTube search and download via yt-dlp + ffmpeg

pub mod demo;
pub mod ytdlp;

use crate::core::config;
use crate::core::error::{AppError, AppResult};
use crate::core::metrics;
use crate::download::error::DownloadError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub use demo::DemoSource;
pub use ytdlp::YtDlpSource;

/// One search hit as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCandidate {
    /// Opaque provider id (YouTube video id), unique within one result set
    pub id: String,
    pub title: String,
    /// Display duration (`m:ss` or `h:mm:ss`), `N/A` when unknown
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
}

impl TrackCandidate {
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            duration: duration.into(),
            thumbnail: None,
            channel: None,
            view_count: None,
        }
    }

    /// Public page of the track on YouTube
    pub fn source_url(&self) -> String {
        youtube_url(&self.id)
    }
}

/// Short YouTube link for a video id
pub fn youtube_url(id: &str) -> String {
    format!("https://youtu.be/{}", id)
}

/// Requested MP3 quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl AudioQuality {
    pub const ALL: [AudioQuality; 3] = [AudioQuality::Low, AudioQuality::Medium, AudioQuality::High];

    /// ffmpeg bitrate argument
    pub fn bitrate(self) -> &'static str {
        match self {
            AudioQuality::Low => "128k",
            AudioQuality::Medium => "192k",
            AudioQuality::High => "320k",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AudioQuality::Low => "low",
            AudioQuality::Medium => "medium",
            AudioQuality::High => "high",
        }
    }

    /// Quality used by the plain download button (DEFAULT_QUALITY, high if unset or invalid)
    pub fn configured_default() -> Self {
        config::DEFAULT_QUALITY.parse().unwrap_or_default()
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioQuality {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "128" | "128k" => Ok(AudioQuality::Low),
            "medium" | "192" | "192k" => Ok(AudioQuality::Medium),
            "high" | "320" | "320k" => Ok(AudioQuality::High),
            other => Err(AppError::Validation(format!("Unknown audio quality: {}", other))),
        }
    }
}

/// Browse categories offered by `/popular`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Popular,
    Trending,
    Rock,
    HipHop,
    Electro,
    Jazz,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Popular,
        Category::Trending,
        Category::Rock,
        Category::HipHop,
        Category::Electro,
        Category::Jazz,
    ];

    /// Identifier used in callback data
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Popular => "popular",
            Category::Trending => "trending",
            Category::Rock => "rock",
            Category::HipHop => "hiphop",
            Category::Electro => "electro",
            Category::Jazz => "jazz",
        }
    }

    /// Parses a category id; unknown ids fall back to `Popular`
    pub fn parse_or_popular(raw: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == raw.trim())
            .unwrap_or(Category::Popular)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Popular => "🎵 Popular now",
            Category::Trending => "🔥 Trending",
            Category::Rock => "🎸 Rock",
            Category::HipHop => "🎤 Hip-hop",
            Category::Electro => "🎹 Electronic",
            Category::Jazz => "🎷 Jazz",
        }
    }

    /// Query a search backend runs to fill this category
    pub fn seed_query(self) -> &'static str {
        match self {
            Category::Popular => "top hits this week",
            Category::Trending => "trending music videos",
            Category::Rock => "best rock songs",
            Category::HipHop => "hip hop hits",
            Category::Electro => "electronic music hits",
            Category::Jazz => "jazz classics",
        }
    }
}

/// A ready-to-send MP3
#[derive(Clone)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub title: String,
    pub artist: String,
    pub duration_seconds: Option<u32>,
}

impl fmt::Debug for AudioPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioPayload")
            .field("bytes", &format_args!("{} bytes", self.bytes.len()))
            .field("filename", &self.filename)
            .field("title", &self.title)
            .field("artist", &self.artist)
            .field("duration_seconds", &self.duration_seconds)
            .finish()
    }
}

/// Free-text search backend.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    /// Human-readable name of this backend (e.g. "demo", "yt-dlp")
    fn name(&self) -> &str;

    /// Returns at most `limit` candidates in provider relevance order.
    /// Never fails: backend errors yield an empty list.
    async fn search(&self, query: &str, limit: usize) -> Vec<TrackCandidate>;

    /// Returns tracks for a browse category.
    async fn browse(&self, category: Category, limit: usize) -> Vec<TrackCandidate> {
        self.search(category.seed_query(), limit).await
    }
}

/// Audio download backend.
#[async_trait]
pub trait DownloadAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Materializes the track as MP3 at the requested quality, `None` on any failure.
    async fn download(&self, track_id: &str, quality: AudioQuality) -> Option<AudioPayload>;
}

/// Logs a backend failure and records it as an error metric.
pub(crate) fn report_failure(operation: &str, backend: &str, subject: &str, err: &DownloadError) {
    log::error!("❌ {} failed [{}] for '{}': {}", operation, backend, subject, err);
    metrics::record_error(err.subcategory(), operation);
}

/// The search and download backends selected for this process
#[derive(Clone)]
pub struct Backends {
    pub search: Arc<dyn SearchAdapter>,
    pub download: Arc<dyn DownloadAdapter>,
}

impl Backends {
    /// Builds backends by name: `demo` or `ytdlp` (`yt-dlp`, `youtube` accepted)
    pub fn from_name(name: &str) -> AppResult<Self> {
        match name.trim().to_lowercase().as_str() {
            "demo" => {
                let demo = Arc::new(DemoSource::new(config::DEMO_MEDIA_BASE_URL.as_str())?);
                Ok(Self {
                    search: demo.clone(),
                    download: demo,
                })
            }
            "ytdlp" | "yt-dlp" | "youtube" => {
                let ytdlp = Arc::new(YtDlpSource::from_config());
                Ok(Self {
                    search: ytdlp.clone(),
                    download: ytdlp,
                })
            }
            other => Err(AppError::Config(format!(
                "Unknown MUSIC_BACKEND '{}', expected 'ytdlp' or 'demo'",
                other
            ))),
        }
    }

    /// Builds the backends named by MUSIC_BACKEND
    pub fn from_config() -> AppResult<Self> {
        Self::from_name(config::MUSIC_BACKEND.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_bitrates() {
        assert_eq!(AudioQuality::Low.bitrate(), "128k");
        assert_eq!(AudioQuality::Medium.bitrate(), "192k");
        assert_eq!(AudioQuality::High.bitrate(), "320k");
    }

    #[test]
    fn test_quality_parse() {
        assert_eq!("LOW".parse::<AudioQuality>().unwrap(), AudioQuality::Low);
        assert_eq!("192k".parse::<AudioQuality>().unwrap(), AudioQuality::Medium);
        assert!("best".parse::<AudioQuality>().is_err());
        assert_eq!(AudioQuality::default(), AudioQuality::High);
    }

    #[test]
    fn test_category_fallback() {
        assert_eq!(Category::parse_or_popular("rock"), Category::Rock);
        assert_eq!(Category::parse_or_popular("polka"), Category::Popular);
        for category in Category::ALL {
            assert_eq!(Category::parse_or_popular(category.as_str()), category);
        }
    }

    #[test]
    fn test_backends_by_name() {
        let demo = Backends::from_name("demo").unwrap();
        assert_eq!(demo.search.name(), "demo");
        let ytdlp = Backends::from_name("yt-dlp").unwrap();
        assert_eq!(ytdlp.download.name(), "yt-dlp");
        assert!(Backends::from_name("spotify").is_err());
    }

    #[test]
    fn test_track_candidate_json_skips_missing_fields() {
        let track = TrackCandidate::new("abc", "Title", "1:00");
        let json = serde_json::to_string(&track).unwrap();
        assert_eq!(json, r#"{"id":"abc","title":"Title","duration":"1:00"}"#);
        assert_eq!(track.source_url(), "https://youtu.be/abc");
    }
}
