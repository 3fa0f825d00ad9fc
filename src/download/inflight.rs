use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use teloxide::types::UserId;

/// Users with a download currently running.
///
/// At most one download per user: `try_acquire` hands out a permit that
/// frees the slot when dropped, so every exit path of the download releases it.
#[derive(Clone, Default)]
pub struct InFlightDownloads {
    active: Arc<Mutex<HashSet<UserId>>>,
}

/// Slot held while a user's download runs
#[derive(Debug)]
pub struct DownloadPermit {
    user_id: UserId,
    active: Arc<Mutex<HashSet<UserId>>>,
}

fn lock(set: &Mutex<HashSet<UserId>>) -> MutexGuard<'_, HashSet<UserId>> {
    // Poisoning is ignored: every critical section is a single insert/remove.
    set.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InFlightDownloads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the user's slot, `None` if a download is already running for them.
    pub fn try_acquire(&self, user_id: UserId) -> Option<DownloadPermit> {
        if lock(&self.active).insert(user_id) {
            Some(DownloadPermit {
                user_id,
                active: Arc::clone(&self.active),
            })
        } else {
            None
        }
    }

    pub fn is_busy(&self, user_id: UserId) -> bool {
        lock(&self.active).contains(&user_id)
    }

    pub fn len(&self) -> usize {
        lock(&self.active).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for DownloadPermit {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.user_id);
    }
}
