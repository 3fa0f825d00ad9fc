//! Temp-file hygiene for the yt-dlp backend
//!
//! Each download works inside its own `ScratchDir`, removed when the guard is
//! dropped. A background sweep catches anything a crash left behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::core::metrics;

static SCRATCH_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Per-call working directory, deleted with everything inside on drop.
#[derive(Debug)]
pub struct ScratchDir {
    path: PathBuf,
}

impl ScratchDir {
    /// Creates a fresh, uniquely named directory under `root` (created if missing).
    pub fn create_in(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let seq = SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = root.join(format!("dl-{}-{}-{}", std::process::id(), millis, seq));

        fs::create_dir(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of a file inside the directory
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => log::debug!("Removed scratch dir {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove scratch dir {}: {}", self.path.display(), e),
        }
    }
}

/// Removes every entry directly under `root` last modified more than `max_age` ago.
///
/// Returns the number of removed entries. A missing `root` counts as clean.
pub fn sweep_stale_artifacts(root: &Path, max_age: Duration) -> io::Result<usize> {
    sweep_stale_artifacts_at(root, max_age, SystemTime::now())
}

/// Same as [`sweep_stale_artifacts`] with an explicit notion of "now".
pub fn sweep_stale_artifacts_at(root: &Path, max_age: Duration, now: SystemTime) -> io::Result<usize> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                log::warn!("Cannot stat {}: {}", path.display(), e);
                continue;
            }
        };

        let age = meta
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        let result = if meta.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        match result {
            Ok(()) => {
                log::debug!("Swept stale artifact {} (age {}s)", path.display(), age.as_secs());
                removed += 1;
            }
            Err(e) => log::warn!("Failed to sweep {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

/// Starts the periodic sweep of `root`.
pub fn spawn_sweeper(root: PathBuf, max_age: Duration, every: Duration) -> tokio::task::JoinHandle<()> {
    log::info!(
        "🧹 Temp sweep started for {} (every {}s, retention {}s)",
        root.display(),
        every.as_secs(),
        max_age.as_secs()
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let dir = root.clone();
            match tokio::task::spawn_blocking(move || sweep_stale_artifacts(&dir, max_age)).await {
                Ok(Ok(count)) if count > 0 => {
                    metrics::SWEPT_FILES_TOTAL.inc_by(count as f64);
                    log::info!("🧹 Temp sweep: removed {} stale artifact(s)", count);
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    metrics::record_error("io", "temp_sweep");
                    log::error!("Temp sweep failed: {}", e);
                }
                Err(e) => log::error!("Temp sweep task panicked: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_scratch_dir_removed_on_drop() {
        let root = tempfile::tempdir().unwrap();
        let kept_path;
        {
            let scratch = ScratchDir::create_in(root.path()).unwrap();
            kept_path = scratch.path().to_path_buf();
            File::create(scratch.file("partial.webm")).unwrap();
            assert!(kept_path.exists());
        }
        assert!(!kept_path.exists());
    }

    #[test]
    fn test_scratch_dirs_are_unique() {
        let root = tempfile::tempdir().unwrap();
        let a = ScratchDir::create_in(root.path()).unwrap();
        let b = ScratchDir::create_in(root.path()).unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_sweep_keeps_fresh_entries() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("fresh.mp3")).unwrap();

        let removed = sweep_stale_artifacts(root.path(), Duration::from_secs(3600)).unwrap();
        assert_eq!(removed, 0);
        assert!(root.path().join("fresh.mp3").exists());
    }

    #[test]
    fn test_sweep_removes_entries_older_than_retention() {
        let root = tempfile::tempdir().unwrap();
        File::create(root.path().join("old.mp3")).unwrap();
        fs::create_dir(root.path().join("dl-old")).unwrap();
        File::create(root.path().join("dl-old").join("part.webm")).unwrap();

        let later = SystemTime::now() + Duration::from_secs(2 * 3600);
        let removed = sweep_stale_artifacts_at(root.path(), Duration::from_secs(3600), later).unwrap();

        assert_eq!(removed, 2);
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_sweep_missing_root_is_clean() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("nope");
        assert_eq!(sweep_stale_artifacts(&missing, Duration::ZERO).unwrap(), 0);
    }
}
