//! YtDlpSource - YouTube backend powered by yt-dlp and ffmpeg.
//!
//! Search runs a flat `ytsearchN:` extraction and maps one JSON object per
//! line to a `TrackCandidate`. Download fetches the best audio stream into a
//! per-call scratch directory, transcodes it to MP3 and reads the bytes back.

use std::path::{Path, PathBuf};
use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use crate::core::config;
use crate::core::metrics;
use crate::core::process::{run_with_timeout, stderr_tail};
use crate::core::utils::{audio_filename, format_duration_secs, split_artist_title};
use crate::download::cleanup::ScratchDir;
use crate::download::error::DownloadError;
use crate::download::source::{report_failure, AudioPayload, AudioQuality, DownloadAdapter, SearchAdapter, TrackCandidate};
use crate::download::transcode::{probe_duration_seconds, transcode_to_mp3, Id3Tags};

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

/// Subset of the yt-dlp info JSON we read
#[derive(Debug, Default, Deserialize)]
struct YtDlpEntry {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
    channel: Option<String>,
    uploader: Option<String>,
    view_count: Option<u64>,
    artist: Option<String>,
    track: Option<String>,
}

impl YtDlpEntry {
    fn into_candidate(self) -> Option<TrackCandidate> {
        let id = self.id.filter(|id| !id.trim().is_empty())?;
        let duration = self
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| format_duration_secs(d.round() as u64))
            .unwrap_or_else(|| "N/A".to_string());
        // Flat extraction lists thumbnails smallest first
        let thumbnail = self.thumbnail.or_else(|| self.thumbnails.into_iter().last().map(|t| t.url));

        Some(TrackCandidate {
            title: self.title.unwrap_or_else(|| id.clone()),
            id,
            duration,
            thumbnail,
            channel: self.channel.or(self.uploader),
            view_count: self.view_count,
        })
    }
}

/// Parses `--dump-json` output: one JSON object per line, entries without id skipped.
pub fn parse_search_output(stdout: &str, limit: usize) -> Vec<TrackCandidate> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<YtDlpEntry>(line) {
            Ok(entry) => entry.into_candidate(),
            Err(e) => {
                log::warn!("Skipping unparsable yt-dlp line: {}", e);
                None
            }
        })
        .take(limit)
        .collect()
}

/// YouTube ids are 11 chars of `[A-Za-z0-9_-]`; accept that alphabet with some slack on length
pub fn is_valid_video_id(id: &str) -> bool {
    (6..=64).contains(&id.len()) && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Search and download backend for YouTube.
pub struct YtDlpSource {
    ytdl_bin: String,
    temp_root: PathBuf,
}

impl YtDlpSource {
    pub fn new(ytdl_bin: impl Into<String>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            ytdl_bin: ytdl_bin.into(),
            temp_root: temp_root.into(),
        }
    }

    /// Binary and temp root from YTDL_BIN / TEMP_FILES_DIR
    pub fn from_config() -> Self {
        Self::new(config::YTDL_BIN.as_str(), config::TEMP_FILES_DIR.as_str())
    }

    pub fn search_args(query: &str, limit: usize) -> Vec<String> {
        vec![
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--skip-download".to_string(),
            "--no-warnings".to_string(),
            format!("ytsearch{}:{}", limit, query),
        ]
    }

    pub fn download_args(track_id: &str, output_template: &Path) -> Vec<String> {
        vec![
            "--no-playlist".to_string(),
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            "-f".to_string(),
            "bestaudio/best".to_string(),
            "--dump-json".to_string(),
            "--no-simulate".to_string(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            format!("https://www.youtube.com/watch?v={}", track_id),
        ]
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<TrackCandidate>, DownloadError> {
        let mut cmd = Command::new(&self.ytdl_bin);
        cmd.args(Self::search_args(query, limit));

        let output = run_with_timeout(&mut cmd, config::download::ytdlp_timeout(), "yt-dlp").await?;
        if !output.status.success() {
            return Err(DownloadError::YtDlp(stderr_tail(&output)));
        }

        Ok(parse_search_output(&String::from_utf8_lossy(&output.stdout), limit))
    }

    async fn try_download(&self, track_id: &str, quality: AudioQuality) -> Result<AudioPayload, DownloadError> {
        if !is_valid_video_id(track_id) {
            return Err(DownloadError::Other(format!("Invalid track id: {}", track_id)));
        }

        let scratch = ScratchDir::create_in(&self.temp_root)
            .map_err(|e| DownloadError::Other(format!("Cannot create scratch dir: {}", e)))?;

        let mut cmd = Command::new(&self.ytdl_bin);
        cmd.args(Self::download_args(track_id, &scratch.file("source.%(ext)s")));

        let output = run_with_timeout(&mut cmd, config::download::ytdlp_timeout(), "yt-dlp").await?;
        if !output.status.success() {
            return Err(DownloadError::YtDlp(stderr_tail(&output)));
        }

        let info: YtDlpEntry = String::from_utf8_lossy(&output.stdout)
            .lines()
            .rev()
            .find_map(|line| serde_json::from_str(line).ok())
            .unwrap_or_default();

        let source = find_source_file(scratch.path()).await?;
        let full_title = info.title.clone().unwrap_or_else(|| track_id.to_string());
        let (title, artist) = display_metadata(&info, &full_title);

        let mp3_path = scratch.file("track.mp3");
        transcode_to_mp3(
            &source,
            &mp3_path,
            quality,
            &Id3Tags {
                title: &title,
                artist: &artist,
            },
        )
        .await?;

        let duration_seconds = match info.duration.filter(|d| d.is_finite() && *d > 0.0) {
            Some(d) => Some(d.round() as u32),
            None => probe_duration_seconds(&mp3_path).await,
        };

        let bytes = tokio::fs::read(&mp3_path)
            .await
            .map_err(|e| DownloadError::FileNotFound(format!("{}: {}", mp3_path.display(), e)))?;

        Ok(AudioPayload {
            bytes,
            filename: audio_filename(&full_title),
            title,
            artist,
            duration_seconds,
        })
    }
}

/// Title and artist for tags and the Telegram audio card
fn display_metadata(info: &YtDlpEntry, full_title: &str) -> (String, String) {
    if let (Some(track), Some(artist)) = (&info.track, &info.artist) {
        return (track.clone(), artist.clone());
    }
    match split_artist_title(full_title) {
        (Some(artist), title) => (title, artist),
        (None, title) => {
            let artist = info.channel.clone().or_else(|| info.uploader.clone()).unwrap_or_default();
            (title, artist)
        }
    }
}

async fn find_source_file(dir: &Path) -> Result<PathBuf, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DownloadError::FileNotFound(format!("{}: {}", dir.display(), e)))?;

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_source = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("source.") && !n.ends_with(".part"));
        if is_source {
            return Ok(path);
        }
    }

    Err(DownloadError::FileNotFound(format!(
        "yt-dlp produced no audio file in {}",
        dir.display()
    )))
}

#[async_trait]
impl SearchAdapter for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<TrackCandidate> {
        match self.try_search(query, limit).await {
            Ok(tracks) => {
                log::info!("🔎 yt-dlp search '{}' -> {} result(s)", query, tracks.len());
                tracks
            }
            Err(e) => {
                report_failure("search", "yt-dlp", query, &e);
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl DownloadAdapter for YtDlpSource {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn download(&self, track_id: &str, quality: AudioQuality) -> Option<AudioPayload> {
        let started = Instant::now();
        match self.try_download(track_id, quality).await {
            Ok(payload) => {
                metrics::DOWNLOAD_DURATION_SECONDS
                    .with_label_values(&["yt-dlp"])
                    .observe(started.elapsed().as_secs_f64());
                log::info!(
                    "✅ Downloaded {} at {} ({} bytes) in {:.1}s",
                    track_id,
                    quality.bitrate(),
                    payload.bytes.len(),
                    started.elapsed().as_secs_f64()
                );
                Some(payload)
            }
            Err(e) => {
                report_failure("download", "yt-dlp", track_id, &e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SEARCH_OUTPUT: &str = r#"{"id": "dQw4w9WgXcQ", "title": "Rick Astley - Never Gonna Give You Up (Official Video)", "duration": 212.0, "channel": "Rick Astley", "view_count": 1500000000, "thumbnails": [{"url": "https://i.ytimg.com/small.jpg"}, {"url": "https://i.ytimg.com/big.jpg"}]}
{"title": "entry without id"}

not json at all
{"id": "yPYZpwSpKmA", "title": "Rick Astley - Together Forever", "uploader": "RickAstleyVEVO", "duration": 3725}
"#;

    #[test]
    fn test_parse_search_output_maps_fields() {
        let tracks = parse_search_output(SEARCH_OUTPUT, 5);
        assert_eq!(tracks.len(), 2);

        assert_eq!(tracks[0].id, "dQw4w9WgXcQ");
        assert_eq!(tracks[0].duration, "3:32");
        assert_eq!(tracks[0].channel.as_deref(), Some("Rick Astley"));
        assert_eq!(tracks[0].view_count, Some(1_500_000_000));
        assert_eq!(tracks[0].thumbnail.as_deref(), Some("https://i.ytimg.com/big.jpg"));

        assert_eq!(tracks[1].duration, "1:02:05");
        assert_eq!(tracks[1].channel.as_deref(), Some("RickAstleyVEVO"));
    }

    #[test]
    fn test_parse_search_output_respects_limit() {
        assert_eq!(parse_search_output(SEARCH_OUTPUT, 1).len(), 1);
    }

    #[test]
    fn test_parse_search_output_missing_duration() {
        let tracks = parse_search_output(r#"{"id": "abcdefghijk", "title": "Live"}"#, 5);
        assert_eq!(tracks[0].duration, "N/A");
    }

    #[test]
    fn test_search_args() {
        let args = YtDlpSource::search_args("queen bohemian", 5);
        assert_eq!(args.last().unwrap(), "ytsearch5:queen bohemian");
        assert!(args.contains(&"--flat-playlist".to_string()));
        assert!(args.contains(&"--skip-download".to_string()));
    }

    #[test]
    fn test_download_args_build_watch_url() {
        let args = YtDlpSource::download_args("dQw4w9WgXcQ", Path::new("/tmp/x/source.%(ext)s"));
        assert_eq!(args.last().unwrap(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert!(args.contains(&"/tmp/x/source.%(ext)s".to_string()));
    }

    #[test]
    fn test_video_id_validation() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("uelHwf8o7_U"));
        assert!(!is_valid_video_id("--exec=rm"));
        assert!(!is_valid_video_id("abc"));
        assert!(!is_valid_video_id("id with spaces"));
    }

    #[test]
    fn test_display_metadata_prefers_track_tags() {
        let info = YtDlpEntry {
            title: Some("Queen – Bohemian Rhapsody (Official Video Remastered)".into()),
            track: Some("Bohemian Rhapsody".into()),
            artist: Some("Queen".into()),
            ..Default::default()
        };
        assert_eq!(
            display_metadata(&info, "Queen – Bohemian Rhapsody (Official Video Remastered)"),
            ("Bohemian Rhapsody".to_string(), "Queen".to_string())
        );
    }

    #[test]
    fn test_display_metadata_falls_back_to_channel() {
        let info = YtDlpEntry {
            title: Some("Chill mix".into()),
            channel: Some("Lofi Girl".into()),
            ..Default::default()
        };
        assert_eq!(
            display_metadata(&info, "Chill mix"),
            ("Chill mix".to_string(), "Lofi Girl".to_string())
        );
    }

    #[test]
    fn test_display_metadata_splits_artist_from_title() {
        let info = YtDlpEntry::default();
        assert_eq!(
            display_metadata(&info, "AC/DC - Thunderstruck"),
            ("Thunderstruck".to_string(), "AC/DC".to_string())
        );
    }

    #[tokio::test]
    async fn test_missing_binary_yields_empty_search() {
        let root = tempfile::tempdir().unwrap();
        let source = YtDlpSource::new("melodora-missing-yt-dlp", root.path());
        assert!(source.search("anything", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_scratch_dir() {
        let root = tempfile::tempdir().unwrap();
        let source = YtDlpSource::new("melodora-missing-yt-dlp", root.path());

        assert!(source.download("dQw4w9WgXcQ", AudioQuality::High).await.is_none());
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }
}
