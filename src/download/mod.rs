//! Search/download backends and the temp-file plumbing around them

pub mod cleanup;
pub mod error;
pub mod inflight;
pub mod source;
pub mod transcode;

// Re-exports for convenience
pub use cleanup::{spawn_sweeper, sweep_stale_artifacts, ScratchDir};
pub use error::DownloadError;
pub use inflight::{DownloadPermit, InFlightDownloads};
pub use source::{
    AudioPayload, AudioQuality, Backends, Category, DemoSource, DownloadAdapter, SearchAdapter, TrackCandidate,
    YtDlpSource,
};
