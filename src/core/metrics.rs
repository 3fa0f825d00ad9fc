//! Metrics collection for the bot using Prometheus
//!
//! Tracks searches, downloads, errors and live session count. Exposed in text
//! format on the keep-alive server's `/metrics` endpoint.

use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter, CounterVec, Gauge,
    HistogramVec,
};

lazy_static! {
    /// Searches by outcome
    /// Labels: outcome (results/empty/rejected)
    pub static ref SEARCH_TOTAL: CounterVec = register_counter_vec!(
        "melodora_search_total",
        "Total number of searches by outcome",
        &["outcome"]
    )
    .unwrap();

    /// Download attempts by outcome and quality
    /// Labels: outcome (delivered/fetch_failed/send_failed/busy), quality (low/medium/high)
    pub static ref DOWNLOAD_TOTAL: CounterVec = register_counter_vec!(
        "melodora_download_total",
        "Total number of download presses by outcome",
        &["outcome", "quality"]
    )
    .unwrap();

    /// Time from download press to delivered payload
    /// Labels: backend (demo/yt-dlp)
    pub static ref DOWNLOAD_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "melodora_download_duration_seconds",
        "Time spent fetching and transcoding a track",
        &["backend"],
        vec![0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 240.0]
    )
    .unwrap();

    /// Errors by category and operation
    pub static ref ERRORS_TOTAL: CounterVec = register_counter_vec!(
        "melodora_errors_total",
        "Total number of errors by category and operation",
        &["category", "operation"]
    )
    .unwrap();

    /// Bot commands handled
    pub static ref COMMAND_TOTAL: CounterVec = register_counter_vec!(
        "melodora_command_total",
        "Total number of bot commands handled",
        &["command"]
    )
    .unwrap();

    /// Files removed by the temp sweep
    pub static ref SWEPT_FILES_TOTAL: Counter = register_counter!(
        "melodora_swept_files_total",
        "Temporary artifacts removed by the background sweep"
    )
    .unwrap();

    /// Live (unexpired) search sessions, refreshed on each purge
    pub static ref ACTIVE_SESSIONS: Gauge = register_gauge!(
        "melodora_active_sessions",
        "Search sessions currently held in memory"
    )
    .unwrap();
}

/// Helper function to record an error
pub fn record_error(category: &str, operation: &str) {
    ERRORS_TOTAL.with_label_values(&[category, operation]).inc();
}

/// Helper function to record a search outcome
pub fn record_search(outcome: &str) {
    SEARCH_TOTAL.with_label_values(&[outcome]).inc();
}

/// Helper function to record a download outcome
pub fn record_download(outcome: &str, quality: &str) {
    DOWNLOAD_TOTAL.with_label_values(&[outcome, quality]).inc();
}

/// Helper function to record command usage
pub fn record_command(command: &str) {
    COMMAND_TOTAL.with_label_values(&[command]).inc();
}

/// Renders every registered metric in the Prometheus text exposition format
pub fn encode_text() -> Result<String, prometheus::Error> {
    use prometheus::{Encoder, TextEncoder};

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_search_increments() {
        let before = SEARCH_TOTAL.with_label_values(&["test_outcome"]).get();
        record_search("test_outcome");
        let after = SEARCH_TOTAL.with_label_values(&["test_outcome"]).get();
        assert!((after - before - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_metrics_are_gathered() {
        record_error("test", "metrics_gathered");
        let text = encode_text().unwrap();
        assert!(text.contains("melodora_errors_total"));
    }
}
