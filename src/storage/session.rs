use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use prometheus::Gauge;
use teloxide::types::UserId;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::{config, metrics};
use crate::download::source::TrackCandidate;

/// Where a user is in the search -> select -> download flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// `/search` was sent without a query; the next text is the query
    AwaitingQuery,
    ShowingResults,
    ShowingDetail,
}

/// Most recent search of one user
#[derive(Debug, Clone)]
pub struct Session {
    pub query: String,
    pub tracks: Vec<TrackCandidate>,
    pub searched_at: DateTime<Utc>,
    pub state: InteractionState,
    touched: Instant,
    generation: u64,
}

impl Session {
    fn empty(state: InteractionState, generation: u64) -> Self {
        Self {
            query: String::new(),
            tracks: Vec::new(),
            searched_at: Utc::now(),
            state,
            touched: Instant::now(),
            generation,
        }
    }

    pub fn find_track(&self, track_id: &str) -> Option<&TrackCandidate> {
        self.tracks.iter().find(|t| t.id == track_id)
    }

    /// Changes on every write to the session
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Per-user search sessions with TTL eviction.
///
/// One session per user; a new search replaces the previous one. An entry
/// expires once `ttl` has passed since it was last written, either lazily on
/// read or by the periodic purge.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<UserId, Session>>>,
    next_generation: Arc<AtomicU64>,
    active: Gauge,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(config::session::ttl())
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(1)),
            active: metrics::ACTIVE_SESSIONS.clone(),
            ttl,
        }
    }

    /// Reports the session count to `gauge` instead of the global one
    pub fn with_gauge(mut self, gauge: Gauge) -> Self {
        self.active = gauge;
        self
    }

    fn is_live(&self, session: &Session) -> bool {
        session.touched.elapsed() < self.ttl
    }

    fn bump(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn touch(&self, session: &mut Session) {
        session.touched = Instant::now();
        session.generation = self.bump();
    }

    /// Stores a completed search and moves the user to `ShowingResults`
    pub async fn put_results(&self, user_id: UserId, query: &str, tracks: Vec<TrackCandidate>) {
        let session = Session {
            query: query.to_string(),
            tracks,
            searched_at: Utc::now(),
            state: InteractionState::ShowingResults,
            touched: Instant::now(),
            generation: self.bump(),
        };
        let mut sessions = self.sessions.lock().await;
        sessions.insert(user_id, session);
        self.active.set(sessions.len() as f64);
    }

    /// Returns a copy of the user's live session, evicting it if expired
    pub async fn get(&self, user_id: UserId) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(&user_id) {
            Some(session) if self.is_live(session) => Some(session.clone()),
            Some(_) => {
                sessions.remove(&user_id);
                self.active.set(sessions.len() as f64);
                None
            }
            None => None,
        }
    }

    /// Looks a track up in the user's current result list
    pub async fn find_track(&self, user_id: UserId, track_id: &str) -> Option<TrackCandidate> {
        self.get(user_id).await.and_then(|s| s.find_track(track_id).cloned())
    }

    /// Current state, `Idle` when the user has no live session
    pub async fn state(&self, user_id: UserId) -> InteractionState {
        self.get(user_id).await.map(|s| s.state).unwrap_or_default()
    }

    /// Moves the user to `state`, creating an empty session if needed
    pub async fn set_state(&self, user_id: UserId, state: InteractionState) {
        let mut sessions = self.sessions.lock().await;
        let live = sessions.get(&user_id).is_some_and(|s| self.is_live(s));
        if !live {
            sessions.insert(user_id, Session::empty(state, self.bump()));
            self.active.set(sessions.len() as f64);
            return;
        }
        if let Some(session) = sessions.get_mut(&user_id) {
            session.state = state;
            self.touch(session);
        }
    }

    /// Moves the user to `state` only if the session is still at `generation`.
    ///
    /// Returns `false` (and changes nothing) when the session was written,
    /// replaced or evicted in between.
    pub async fn set_state_if_unchanged(
        &self,
        user_id: UserId,
        generation: u64,
        state: InteractionState,
    ) -> bool {
        let ttl = self.ttl;
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&user_id) {
            Some(session) if session.generation == generation && session.touched.elapsed() < ttl => {
                session.state = state;
                self.touch(session);
                true
            }
            _ => false,
        }
    }

    /// Drops the result list and returns the user to `Idle` (the "new search" control)
    pub async fn clear_tracks(&self, user_id: UserId) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get_mut(&user_id) {
            session.tracks.clear();
            session.state = InteractionState::Idle;
            self.touch(session);
        }
    }

    /// Removes expired sessions, returns how many were dropped
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.touched.elapsed() < self.ttl);
        let removed = before - sessions.len();
        self.active.set(sessions.len() as f64);
        if removed > 0 {
            log::debug!("Purged {} expired session(s)", removed);
        }
        removed
    }

    /// Number of stored sessions, expired ones included until purged
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Runs `purge_expired` every `every`
    pub fn spawn_purge_task(&self, every: Duration) -> tokio::task::JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                store.purge_expired().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tracks() -> Vec<TrackCandidate> {
        vec![
            TrackCandidate::new("a1", "First", "1:00"),
            TrackCandidate::new("b2", "Second", "2:00"),
        ]
    }

    #[tokio::test]
    async fn test_put_results_overwrites_previous_search() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put_results(UserId(1), "first query", tracks()).await;
        store
            .put_results(UserId(1), "second query", vec![TrackCandidate::new("c3", "Third", "3:00")])
            .await;

        let session = store.get(UserId(1)).await.unwrap();
        assert_eq!(session.query, "second query");
        assert_eq!(session.tracks.len(), 1);
        assert_eq!(session.state, InteractionState::ShowingResults);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_track() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put_results(UserId(1), "q", tracks()).await;

        assert_eq!(store.find_track(UserId(1), "b2").await.unwrap().title, "Second");
        assert!(store.find_track(UserId(1), "zz").await.is_none());
        assert!(store.find_track(UserId(2), "a1").await.is_none());
    }

    #[tokio::test]
    async fn test_clear_tracks_returns_to_idle() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put_results(UserId(1), "q", tracks()).await;
        store.clear_tracks(UserId(1)).await;

        let session = store.get(UserId(1)).await.unwrap();
        assert!(session.tracks.is_empty());
        assert_eq!(session.query, "q");
        assert_eq!(session.state, InteractionState::Idle);
    }

    #[tokio::test]
    async fn test_set_state_without_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert_eq!(store.state(UserId(5)).await, InteractionState::Idle);

        store.set_state(UserId(5), InteractionState::AwaitingQuery).await;
        assert_eq!(store.state(UserId(5)).await, InteractionState::AwaitingQuery);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_expires_lazily_on_read() {
        let store = SessionStore::new(Duration::from_secs(3600));
        store.put_results(UserId(1), "q", tracks()).await;

        tokio::time::advance(Duration::from_secs(3599)).await;
        assert!(store.get(UserId(1)).await.is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get(UserId(1)).await.is_none());
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_removes_only_expired() {
        let store = SessionStore::new(Duration::from_secs(100));
        store.put_results(UserId(1), "old", tracks()).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        store.put_results(UserId(2), "new", tracks()).await;
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(store.purge_expired().await, 1);
        assert!(store.get(UserId(2)).await.is_some());
        assert!(store.get(UserId(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_conditional_state_change_skips_newer_search() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put_results(UserId(1), "first", tracks()).await;
        let generation = store.get(UserId(1)).await.unwrap().generation();

        store.put_results(UserId(1), "second", tracks()).await;
        assert!(
            !store
                .set_state_if_unchanged(UserId(1), generation, InteractionState::Idle)
                .await
        );
        assert_eq!(store.state(UserId(1)).await, InteractionState::ShowingResults);

        let current = store.get(UserId(1)).await.unwrap().generation();
        assert!(
            store
                .set_state_if_unchanged(UserId(1), current, InteractionState::Idle)
                .await
        );
        assert_eq!(store.state(UserId(1)).await, InteractionState::Idle);
        assert_eq!(store.get(UserId(1)).await.unwrap().query, "second");
    }

    #[tokio::test]
    async fn test_every_write_changes_generation() {
        let store = SessionStore::new(Duration::from_secs(60));
        store.put_results(UserId(1), "q", tracks()).await;
        let first = store.get(UserId(1)).await.unwrap().generation();

        store.set_state(UserId(1), InteractionState::ShowingDetail).await;
        let second = store.get(UserId(1)).await.unwrap().generation();
        assert_ne!(first, second);

        assert!(
            !store
                .set_state_if_unchanged(UserId(1), first, InteractionState::Idle)
                .await
        );
        assert_eq!(store.state(UserId(1)).await, InteractionState::ShowingDetail);
    }

    #[tokio::test]
    async fn test_conditional_state_change_does_not_create_session() {
        let store = SessionStore::new(Duration::from_secs(60));
        assert!(!store.set_state_if_unchanged(UserId(9), 1, InteractionState::Idle).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_active_sessions_gauge_follows_writes_and_evictions() {
        let gauge = Gauge::new("test_active_sessions", "sessions in this store").unwrap();
        let store = SessionStore::new(Duration::from_secs(10)).with_gauge(gauge.clone());

        store.put_results(UserId(1), "q", tracks()).await;
        assert_eq!(gauge.get(), 1.0);
        store.set_state(UserId(2), InteractionState::AwaitingQuery).await;
        assert_eq!(gauge.get(), 2.0);

        tokio::time::advance(Duration::from_secs(6)).await;
        store.set_state(UserId(2), InteractionState::Idle).await;
        tokio::time::advance(Duration::from_secs(5)).await;

        assert!(store.get(UserId(1)).await.is_none());
        assert_eq!(gauge.get(), 1.0);
        assert_eq!(store.purge_expired().await, 0);
        assert_eq!(gauge.get(), 1.0);
    }
}
