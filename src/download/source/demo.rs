//! DemoSource - canned catalog backend.
//!
//! Searches a fixed three-track catalog and serves downloads from pre-hosted
//! MP3 files. Useful for running the bot without yt-dlp/ffmpeg installed.

use std::time::Instant;

use crate::core::error::AppResult;
use crate::core::{config, metrics};
use crate::core::utils::{audio_filename, parse_duration_display, split_artist_title};
use crate::download::error::DownloadError;
use crate::download::source::{
    report_failure, AudioPayload, AudioQuality, Category, DownloadAdapter, SearchAdapter, TrackCandidate,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use url::Url;

/// (id, title, duration, hosted file name)
const CATALOG: &[(&str, &str, &str, &str)] = &[
    (
        "dQw4w9WgXcQ",
        "Rick Astley - Never Gonna Give You Up",
        "3:32",
        "qg0zob.mp3",
    ),
    (
        "kJQP7kiw5Fk",
        "Luis Fonsi - Despacito ft. Daddy Yankee",
        "3:59",
        "luvrwr.mp3",
    ),
    ("JGwWNGJdvx8", "Ed Sheeran - Shape of You", "3:53", "ec9o4o.mp3"),
];

const TRENDING: &[(&str, &str)] = &[
    ("uelHwf8o7_U", "Drake - God's Plan"),
    ("CevxZvSJLk8", "The Weeknd - Blinding Lights"),
];

const ROCK: &[(&str, &str)] = &[
    ("v2AC41dglnM", "AC/DC - Thunderstruck"),
    ("rBqdRkQ9gLA", "Queen - Bohemian Rhapsody"),
];

fn thumbnail_url(id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id)
}

fn catalog_track(&(id, title, duration, _): &(&str, &str, &str, &str)) -> TrackCandidate {
    TrackCandidate {
        thumbnail: Some(thumbnail_url(id)),
        ..TrackCandidate::new(id, title, duration)
    }
}

fn listed_track(&(id, title): &(&str, &str)) -> TrackCandidate {
    TrackCandidate {
        thumbnail: Some(thumbnail_url(id)),
        ..TrackCandidate::new(id, title, "N/A")
    }
}

/// True when every whitespace-separated query word occurs in the title (case-insensitive)
fn matches_query(title: &str, query: &str) -> bool {
    let title = title.to_lowercase();
    let mut words = query.split_whitespace().peekable();
    if words.peek().is_none() {
        return false;
    }
    words.all(|word| title.contains(&word.to_lowercase()))
}

/// Demo backend for both search and download.
pub struct DemoSource {
    client: Client,
    base_url: Url,
}

impl DemoSource {
    /// Creates the source serving files relative to `base_url`
    pub fn new(base_url: &str) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(concat!("melodora/", env!("CARGO_PKG_VERSION")))
            .timeout(config::network::media_fetch_timeout())
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self { client, base_url })
    }

    /// Hosted file URL for a catalog id, `None` for unknown ids
    pub fn media_url(&self, track_id: &str) -> Option<Url> {
        CATALOG
            .iter()
            .find(|(id, ..)| *id == track_id)
            .and_then(|(.., file)| self.base_url.join(file).ok())
    }

    async fn fetch(&self, url: Url) -> Result<Vec<u8>, DownloadError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::Http(format!("Request to {} failed: {}", url, e)))?;

        if response.status() != StatusCode::OK {
            return Err(DownloadError::Http(format!("{} answered {}", url, response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| DownloadError::Http(format!("Reading body of {} failed: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl SearchAdapter for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<TrackCandidate> {
        CATALOG
            .iter()
            .filter(|(_, title, ..)| matches_query(title, query))
            .take(limit)
            .map(catalog_track)
            .collect()
    }

    async fn browse(&self, category: Category, limit: usize) -> Vec<TrackCandidate> {
        let tracks: Vec<TrackCandidate> = match category {
            Category::Trending => TRENDING.iter().map(listed_track).collect(),
            Category::Rock => ROCK.iter().map(listed_track).collect(),
            _ => CATALOG.iter().map(catalog_track).collect(),
        };
        tracks.into_iter().take(limit).collect()
    }
}

#[async_trait]
impl DownloadAdapter for DemoSource {
    fn name(&self) -> &str {
        "demo"
    }

    /// Quality is ignored: the hosted files come in a single bitrate.
    async fn download(&self, track_id: &str, _quality: AudioQuality) -> Option<AudioPayload> {
        let Some((_, title, duration, _)) = CATALOG.iter().find(|(id, ..)| *id == track_id) else {
            log::warn!("Demo catalog has no file for track {}", track_id);
            return None;
        };
        let url = self.media_url(track_id)?;

        let started = Instant::now();
        match self.fetch(url).await {
            Ok(bytes) => {
                metrics::DOWNLOAD_DURATION_SECONDS
                    .with_label_values(&["demo"])
                    .observe(started.elapsed().as_secs_f64());
                let (artist, song) = split_artist_title(title);
                Some(AudioPayload {
                    bytes,
                    filename: audio_filename(title),
                    title: song,
                    artist: artist.unwrap_or_default(),
                    duration_seconds: parse_duration_display(duration),
                })
            }
            Err(e) => {
                report_failure("download", "demo", track_id, &e);
                None
            }
        }
    }
}
