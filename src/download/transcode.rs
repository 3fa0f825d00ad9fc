//! MP3 transcoding through ffmpeg

use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

use crate::core::config;
use crate::core::process::{run_with_timeout, stderr_tail, FFPROBE_TIMEOUT};
use crate::download::error::DownloadError;
use crate::download::source::AudioQuality;

/// Tags written into the MP3
#[derive(Debug, Clone, Default)]
pub struct Id3Tags<'a> {
    pub title: &'a str,
    pub artist: &'a str,
}

/// Builds the ffmpeg argument list for an MP3 transcode at `quality`.
pub fn ffmpeg_args(input: &Path, output: &Path, quality: AudioQuality, tags: &Id3Tags<'_>) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .into_iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_owned());

    for arg in ["-vn", "-acodec", "libmp3lame", "-b:a", quality.bitrate(), "-id3v2_version", "3"] {
        args.push(arg.into());
    }
    if !tags.title.is_empty() {
        args.push("-metadata".into());
        args.push(format!("title={}", tags.title).into());
    }
    if !tags.artist.is_empty() {
        args.push("-metadata".into());
        args.push(format!("artist={}", tags.artist).into());
    }

    args.push(output.as_os_str().to_owned());
    args
}

/// Transcodes `input` into an MP3 at `output`, bounded by the ffmpeg timeout.
pub async fn transcode_to_mp3(
    input: &Path,
    output: &Path,
    quality: AudioQuality,
    tags: &Id3Tags<'_>,
) -> Result<(), DownloadError> {
    if !input.exists() {
        return Err(DownloadError::FileNotFound(input.display().to_string()));
    }

    log::debug!(
        "🎚️ Transcoding {} -> {} at {}",
        input.display(),
        output.display(),
        quality.bitrate()
    );

    let mut cmd = Command::new(config::FFMPEG_BIN.as_str());
    cmd.args(ffmpeg_args(input, output, quality, tags));

    let output_status = run_with_timeout(&mut cmd, config::download::ffmpeg_timeout(), "ffmpeg").await?;
    if !output_status.status.success() {
        let stderr = stderr_tail(&output_status);
        log::error!("FFmpeg transcode error: {}", stderr);
        return Err(DownloadError::Ffmpeg(stderr));
    }

    if !output.exists() {
        return Err(DownloadError::FileNotFound(output.display().to_string()));
    }
    Ok(())
}

/// Reads the duration of a media file with ffprobe, `None` when it can't be determined.
pub async fn probe_duration_seconds(path: &Path) -> Option<u32> {
    let mut cmd = Command::new(config::FFPROBE_BIN.as_str());
    cmd.args([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ])
    .arg(path);

    let output = run_with_timeout(&mut cmd, FFPROBE_TIMEOUT, "ffprobe").await.ok()?;
    parse_probe_duration(&String::from_utf8_lossy(&output.stdout))
}

fn parse_probe_duration(raw: &str) -> Option<u32> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(secs.round() as u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn as_strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_ffmpeg_args_bitrate_and_tags() {
        let args = ffmpeg_args(
            &PathBuf::from("/tmp/in.webm"),
            &PathBuf::from("/tmp/out.mp3"),
            AudioQuality::Medium,
            &Id3Tags {
                title: "Thunderstruck",
                artist: "AC/DC",
            },
        );
        let args = as_strings(&args);

        let br = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[br + 1], "192k");
        assert!(args.contains(&"title=Thunderstruck".to_string()));
        assert!(args.contains(&"artist=AC/DC".to_string()));
        assert_eq!(args.last().unwrap(), "/tmp/out.mp3");
        assert_eq!(&args[..4], &["-hide_banner", "-loglevel", "error", "-y"]);
    }

    #[test]
    fn test_ffmpeg_args_skip_empty_tags() {
        let args = ffmpeg_args(
            &PathBuf::from("in.m4a"),
            &PathBuf::from("out.mp3"),
            AudioQuality::Low,
            &Id3Tags::default(),
        );
        assert!(!as_strings(&args).contains(&"-metadata".to_string()));
    }

    #[test]
    fn test_parse_probe_duration() {
        assert_eq!(parse_probe_duration("212.480000\n"), Some(212));
        assert_eq!(parse_probe_duration("N/A"), None);
        assert_eq!(parse_probe_duration(""), None);
    }

    #[tokio::test]
    async fn test_missing_input_is_file_not_found() {
        let err = transcode_to_mp3(
            Path::new("/nonexistent/melodora/input.webm"),
            Path::new("/nonexistent/melodora/out.mp3"),
            AudioQuality::High,
            &Id3Tags::default(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.subcategory(), "file_not_found");
    }
}
