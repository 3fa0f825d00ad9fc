//! In-memory usage statistics
//!
//! Process-lifetime counters for the admin `/stats` report. Nothing here is
//! persisted; a restart starts from zero.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use teloxide::types::UserId;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Number of users shown in the report ranking
pub const TOP_USERS_LIMIT: usize = 10;

#[derive(Debug, Clone)]
struct UserCounters {
    username: String,
    downloads: u64,
    first_seen: DateTime<Utc>,
    /// Registration order, used to keep the ranking stable on ties
    seq: u64,
}

#[derive(Debug, Default)]
struct StatsInner {
    total_downloads: u64,
    failed_downloads: u64,
    users: HashMap<UserId, UserCounters>,
    next_seq: u64,
}

impl StatsInner {
    fn entry(&mut self, user_id: UserId, username: &str) -> &mut UserCounters {
        let seq = self.next_seq;
        let counters = self.users.entry(user_id).or_insert_with(|| UserCounters {
            username: username.to_string(),
            downloads: 0,
            first_seen: Utc::now(),
            seq,
        });
        if counters.seq == seq {
            self.next_seq += 1;
        }
        if !username.is_empty() {
            counters.username = username.to_string();
        }
        counters
    }
}

/// One row of the top-users ranking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDownloads {
    pub user_id: UserId,
    pub username: String,
    pub downloads: u64,
    pub first_seen: DateTime<Utc>,
}

/// Read-only projection rendered by `/stats`
#[derive(Debug, Clone)]
pub struct StatsReport {
    pub total_downloads: u64,
    pub failed_downloads: u64,
    pub unique_users: usize,
    pub started_at: DateTime<Utc>,
    pub uptime: Duration,
    pub top_users: Vec<UserDownloads>,
}

/// Shared download counters
///
/// Cloning is cheap; all clones update the same counters.
#[derive(Clone)]
pub struct Stats {
    inner: Arc<Mutex<StatsInner>>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl Stats {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(StatsInner::default())),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Registers a user (on /start) without counting anything.
    /// Refreshes the stored username when the user is already known.
    pub async fn register_user(&self, user_id: UserId, username: &str) {
        let mut inner = self.inner.lock().await;
        inner.entry(user_id, username);
    }

    /// Counts one delivered download for the user
    pub async fn record_delivery(&self, user_id: UserId, username: &str) {
        let mut inner = self.inner.lock().await;
        inner.total_downloads += 1;
        inner.entry(user_id, username).downloads += 1;
    }

    /// Counts one failed download (fetch or delivery)
    pub async fn record_failure(&self) {
        self.inner.lock().await.failed_downloads += 1;
    }

    pub async fn total_downloads(&self) -> u64 {
        self.inner.lock().await.total_downloads
    }

    pub async fn failed_downloads(&self) -> u64 {
        self.inner.lock().await.failed_downloads
    }

    /// Downloads counted for one user, `None` if the user never registered or downloaded
    pub async fn user_downloads(&self, user_id: UserId) -> Option<u64> {
        self.inner.lock().await.users.get(&user_id).map(|u| u.downloads)
    }

    /// Builds the admin report with the `top_n` users ranked by downloads.
    /// Ties keep registration order.
    pub async fn report(&self, top_n: usize) -> StatsReport {
        let inner = self.inner.lock().await;

        let mut ranked: Vec<(&UserId, &UserCounters)> = inner.users.iter().collect();
        ranked.sort_by(|(_, a), (_, b)| b.downloads.cmp(&a.downloads).then(a.seq.cmp(&b.seq)));

        let top_users = ranked
            .into_iter()
            .take(top_n)
            .map(|(user_id, counters)| UserDownloads {
                user_id: *user_id,
                username: counters.username.clone(),
                downloads: counters.downloads,
                first_seen: counters.first_seen,
            })
            .collect();

        StatsReport {
            total_downloads: inner.total_downloads,
            failed_downloads: inner.failed_downloads,
            unique_users: inner.users.len(),
            started_at: self.started_at,
            uptime: self.started.elapsed(),
            top_users,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_delivery_increments_global_and_user_counters() {
        let stats = Stats::new();
        stats.record_delivery(UserId(1), "alice").await;

        assert_eq!(stats.total_downloads().await, 1);
        assert_eq!(stats.user_downloads(UserId(1)).await, Some(1));
        assert_eq!(stats.failed_downloads().await, 0);
    }

    #[tokio::test]
    async fn test_failure_only_touches_failed_counter() {
        let stats = Stats::new();
        stats.register_user(UserId(1), "alice").await;
        stats.record_failure().await;

        assert_eq!(stats.failed_downloads().await, 1);
        assert_eq!(stats.total_downloads().await, 0);
        assert_eq!(stats.user_downloads(UserId(1)).await, Some(0));
    }

    #[tokio::test]
    async fn test_register_user_keeps_counts_and_updates_name() {
        let stats = Stats::new();
        stats.record_delivery(UserId(7), "old_name").await;
        stats.register_user(UserId(7), "new_name").await;

        let report = stats.report(TOP_USERS_LIMIT).await;
        assert_eq!(report.unique_users, 1);
        assert_eq!(report.top_users[0].username, "new_name");
        assert_eq!(report.top_users[0].downloads, 1);
    }

    #[tokio::test]
    async fn test_report_ranks_descending_with_stable_ties() {
        let stats = Stats::new();
        stats.register_user(UserId(1), "first").await;
        stats.register_user(UserId(2), "second").await;
        stats.register_user(UserId(3), "third").await;

        stats.record_delivery(UserId(3), "third").await;
        stats.record_delivery(UserId(3), "third").await;
        stats.record_delivery(UserId(2), "second").await;
        stats.record_delivery(UserId(1), "first").await;

        let report = stats.report(TOP_USERS_LIMIT).await;
        let order: Vec<u64> = report.top_users.iter().map(|u| u.user_id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(report.total_downloads, 4);
    }

    #[tokio::test]
    async fn test_report_truncates_to_top_n() {
        let stats = Stats::new();
        for id in 0..15u64 {
            stats.record_delivery(UserId(id), &format!("user{}", id)).await;
        }

        let report = stats.report(TOP_USERS_LIMIT).await;
        assert_eq!(report.unique_users, 15);
        assert_eq!(report.top_users.len(), 10);
    }
}
