//! Counting search/download backends and a recording audio sink

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use melodora::core::error::{AppError, AppResult};
use melodora::download::source::{AudioPayload, AudioQuality, Category, DownloadAdapter, SearchAdapter, TrackCandidate};
use melodora::telegram::AudioSink;

pub fn track(id: &str, title: &str) -> TrackCandidate {
    TrackCandidate::new(id, title, "3:30")
}

/// Search backend answering every query with the same list
#[derive(Default)]
pub struct MockSearch {
    results: Vec<TrackCandidate>,
    calls: AtomicUsize,
    last_limit: AtomicUsize,
}

impl MockSearch {
    pub fn with_results(results: Vec<TrackCandidate>) -> Arc<Self> {
        Arc::new(Self {
            results,
            ..Default::default()
        })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> usize {
        self.last_limit.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchAdapter for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, _query: &str, limit: usize) -> Vec<TrackCandidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.last_limit.store(limit, Ordering::SeqCst);
        self.results.iter().take(limit).cloned().collect()
    }

    async fn browse(&self, _category: Category, limit: usize) -> Vec<TrackCandidate> {
        self.results.iter().take(limit).cloned().collect()
    }
}

/// Download backend that succeeds or fails on demand, optionally waiting for a gate
#[derive(Default)]
pub struct MockDownload {
    fail: bool,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
    qualities: Mutex<Vec<AudioQuality>>,
}

impl MockDownload {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    /// Blocks every download until `gate` is notified
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn qualities(&self) -> Vec<AudioQuality> {
        self.qualities.lock().await.clone()
    }
}

#[async_trait]
impl DownloadAdapter for MockDownload {
    fn name(&self) -> &str {
        "mock"
    }

    async fn download(&self, track_id: &str, quality: AudioQuality) -> Option<AudioPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.qualities.lock().await.push(quality);

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.fail {
            return None;
        }

        Some(AudioPayload {
            bytes: vec![0xFF, 0xFB, 0x90, 0x00],
            filename: format!("{}.mp3", track_id),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            duration_seconds: Some(210),
        })
    }
}

/// Sink that records what it was asked to deliver
#[derive(Default)]
pub struct RecordingSink {
    fail: AtomicBool,
    started: AtomicUsize,
    delivered: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let sink = Self::default();
        sink.fail.store(true, Ordering::SeqCst);
        Arc::new(sink)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub async fn delivered(&self) -> Vec<String> {
        self.delivered.lock().await.clone()
    }
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn started(&self, _track: &TrackCandidate) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    async fn deliver(&self, track: &TrackCandidate, _payload: &AudioPayload) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Validation("chat rejected the upload".to_string()));
        }
        self.delivered.lock().await.push(track.id.clone());
        Ok(())
    }
}
