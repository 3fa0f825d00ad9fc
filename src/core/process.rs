//! Process execution utilities with timeout support
//!
//! Every external tool call (yt-dlp, ffmpeg, ffprobe) goes through here so a
//! hung process never blocks an update handler.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::download::error::DownloadError;

/// Timeout for ffprobe metadata queries (30 seconds)
pub const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs `cmd` to completion, killing the child when `timeout` expires.
///
/// `tool` names the binary in error messages and picks the error variant
/// for spawn failures (`"yt-dlp"` -> `YtDlp`, anything else -> `Ffmpeg`).
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration, tool: &str) -> Result<Output, DownloadError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            let msg = format!("Failed to run {}: {}", tool, e);
            Err(if tool == "yt-dlp" {
                DownloadError::YtDlp(msg)
            } else {
                DownloadError::Ffmpeg(msg)
            })
        }
        Err(_) => Err(DownloadError::Timeout(format!(
            "{} timed out after {}s",
            tool,
            timeout.as_secs()
        ))),
    }
}

/// Last non-empty stderr line, for compact error messages
pub fn stderr_tail(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("no error output")
        .trim()
        .to_string()
}
