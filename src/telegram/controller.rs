//! Search -> select -> download flow
//!
//! `Controller` owns every piece of cross-request state (sessions, stats,
//! in-flight downloads) and the two backends. It knows nothing about
//! Telegram message formatting: each operation returns an outcome that the
//! handlers render. Delivery of the audio goes through the `AudioSink` seam
//! so the flow can run against a recording sink in tests.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::types::{User, UserId};

use crate::core::error::AppResult;
use crate::core::stats::{Stats, StatsReport, TOP_USERS_LIMIT};
use crate::core::{config, metrics};
use crate::download::inflight::InFlightDownloads;
use crate::download::source::{
    AudioPayload, AudioQuality, Backends, Category, DownloadAdapter, SearchAdapter, TrackCandidate,
};
use crate::storage::session::{InteractionState, SessionStore};

/// Who pressed the button or sent the text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUser {
    pub id: UserId,
    /// `@username` if set, first name otherwise
    pub display_name: String,
}

impl ChatUser {
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    pub fn from_user(user: &User) -> Self {
        let display_name = user
            .username
            .as_ref()
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| user.first_name.clone());
        Self::new(user.id, display_name)
    }
}

/// Where the downloaded audio goes
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Called once the download slot is taken, before fetching
    async fn started(&self, _track: &TrackCandidate) {}

    /// Delivers the payload; `Ok` means the chat received it
    async fn deliver(&self, track: &TrackCandidate, payload: &AudioPayload) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Query shorter than the minimum; nothing was searched
    TooShort,
    /// Backend answered with nothing (or failed)
    NoResults { query: String },
    Results { query: String, tracks: Vec<TrackCandidate> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectOutcome {
    NotFound,
    Detail(TrackCandidate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoreOutcome {
    /// The user has no previous query to extend
    NoQuery,
    Search(SearchOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseOutcome {
    Empty(Category),
    Tracks { category: Category, tracks: Vec<TrackCandidate> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Another download of this user is still running; nothing was fetched
    Busy,
    Delivered { track: TrackCandidate },
    /// Backend produced nothing; offer the source link
    FetchFailed { track: TrackCandidate },
    /// Payload was fetched but the chat did not receive it
    SendFailed { track: TrackCandidate },
}

#[derive(Debug, Clone)]
pub enum StatsOutcome {
    Forbidden,
    Report(StatsReport),
}

/// Interaction controller shared by all update handlers
#[derive(Clone)]
pub struct Controller {
    sessions: SessionStore,
    stats: Stats,
    inflight: InFlightDownloads,
    search: Arc<dyn SearchAdapter>,
    download: Arc<dyn DownloadAdapter>,
    admin_id: Option<UserId>,
    search_limit: usize,
    display_cap: usize,
    default_quality: AudioQuality,
}

impl Controller {
    /// Controller with fresh state and limits from the environment
    pub fn new(backends: Backends) -> Self {
        Self {
            sessions: SessionStore::default(),
            stats: Stats::new(),
            inflight: InFlightDownloads::new(),
            search: backends.search,
            download: backends.download,
            admin_id: config::admin::ADMIN_USER_ID.map(UserId),
            search_limit: *config::search::LIMIT,
            display_cap: *config::search::DISPLAY_CAP,
            default_quality: AudioQuality::configured_default(),
        }
    }

    pub fn with_sessions(mut self, sessions: SessionStore) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn with_admin(mut self, admin_id: Option<UserId>) -> Self {
        self.admin_id = admin_id;
        self
    }

    /// Per-query backend limit and rendered list cap
    pub fn with_limits(mut self, search_limit: usize, display_cap: usize) -> Self {
        self.search_limit = search_limit;
        self.display_cap = display_cap;
        self
    }

    pub fn with_default_quality(mut self, quality: AudioQuality) -> Self {
        self.default_quality = quality;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn default_quality(&self) -> AudioQuality {
        self.default_quality
    }

    pub fn backend_name(&self) -> &str {
        self.search.name()
    }

    /// `/start`: registers the user for the stats report
    pub async fn register(&self, requester: &ChatUser) {
        self.stats.register_user(requester.id, &requester.display_name).await;
    }

    /// `/search` without argument: the next text message is the query
    pub async fn await_query(&self, requester: &ChatUser) {
        self.sessions
            .set_state(requester.id, InteractionState::AwaitingQuery)
            .await;
    }

    /// Free-text query (or `/search <q>`)
    pub async fn search(&self, requester: &ChatUser, text: &str) -> SearchOutcome {
        self.run_search(requester, text, self.search_limit).await
    }

    async fn run_search(&self, requester: &ChatUser, text: &str, limit: usize) -> SearchOutcome {
        let query = text.trim();
        if query.chars().count() < config::search::MIN_QUERY_CHARS {
            metrics::record_search("rejected");
            return SearchOutcome::TooShort;
        }

        log::info!("🔍 Search by {} [{}]: '{}'", requester.id.0, self.search.name(), query);
        let mut tracks = self.search.search(query, limit).await;
        tracks.truncate(self.display_cap);

        if tracks.is_empty() {
            metrics::record_search("empty");
            return SearchOutcome::NoResults {
                query: query.to_string(),
            };
        }

        metrics::record_search("results");
        self.sessions.put_results(requester.id, query, tracks.clone()).await;
        SearchOutcome::Results {
            query: query.to_string(),
            tracks,
        }
    }

    /// Selection button: opens the detail card of a listed track
    pub async fn select(&self, requester: &ChatUser, track_id: &str) -> SelectOutcome {
        match self.sessions.find_track(requester.id, track_id).await {
            Some(track) => {
                self.sessions
                    .set_state(requester.id, InteractionState::ShowingDetail)
                    .await;
                SelectOutcome::Detail(track)
            }
            None => {
                log::debug!("Track {} not in session of {}", track_id, requester.id.0);
                SelectOutcome::NotFound
            }
        }
    }

    /// Download button. Counts the download only once the sink confirmed delivery.
    /// The session returns to `Idle` afterwards unless the user searched or
    /// selected again while the track was being fetched.
    pub async fn download(
        &self,
        requester: &ChatUser,
        track_id: &str,
        quality: Option<AudioQuality>,
        sink: &dyn AudioSink,
    ) -> DownloadOutcome {
        let quality = quality.unwrap_or(self.default_quality);

        let Some(_permit) = self.inflight.try_acquire(requester.id) else {
            log::info!("⏳ {} pressed download while another one is running", requester.id.0);
            metrics::record_download("busy", quality.as_str());
            return DownloadOutcome::Busy;
        };

        let session = self.sessions.get(requester.id).await;
        let generation = session.as_ref().map(|s| s.generation());
        let track = session
            .as_ref()
            .and_then(|s| s.find_track(track_id).cloned())
            .unwrap_or_else(|| TrackCandidate::new(track_id, track_id, "N/A"));

        sink.started(&track).await;
        log::info!(
            "⬇️ Download {} ({}) for {} via {}",
            track.id,
            quality,
            requester.id.0,
            self.download.name()
        );

        let fetched = self.download.download(&track.id, quality).await;
        if let Some(generation) = generation {
            self.sessions
                .set_state_if_unchanged(requester.id, generation, InteractionState::Idle)
                .await;
        }

        let Some(payload) = fetched else {
            self.stats.record_failure().await;
            metrics::record_download("fetch_failed", quality.as_str());
            log::warn!("❌ Download of {} failed for {}", track.id, requester.id.0);
            return DownloadOutcome::FetchFailed { track };
        };

        match sink.deliver(&track, &payload).await {
            Ok(()) => {
                self.stats
                    .record_delivery(requester.id, &requester.display_name)
                    .await;
                metrics::record_download("delivered", quality.as_str());
                log::info!("✅ Delivered {} to {}", track.id, requester.id.0);
                DownloadOutcome::Delivered { track }
            }
            Err(e) => {
                self.stats.record_failure().await;
                metrics::record_download("send_failed", quality.as_str());
                metrics::record_error(e.category(), "send_audio");
                log::error!("❌ Failed to send {} to {}: {}", track.id, requester.id.0, e);
                DownloadOutcome::SendFailed { track }
            }
        }
    }

    /// "New search" button: forget the result list
    pub async fn new_search(&self, requester: &ChatUser) {
        self.sessions.clear_tracks(requester.id).await;
    }

    /// "More tracks" button: the last query again, up to the display cap
    pub async fn more_tracks(&self, requester: &ChatUser) -> MoreOutcome {
        let query = match self.sessions.get(requester.id).await {
            Some(session) if !session.query.is_empty() => session.query,
            _ => return MoreOutcome::NoQuery,
        };
        MoreOutcome::Search(self.run_search(requester, &query, self.display_cap).await)
    }

    /// Category button: fills the session from the backend's browse list
    pub async fn browse(&self, requester: &ChatUser, category: Category) -> BrowseOutcome {
        let mut tracks = self.search.browse(category, self.display_cap).await;
        tracks.truncate(self.display_cap);
        if tracks.is_empty() {
            return BrowseOutcome::Empty(category);
        }

        self.sessions
            .put_results(requester.id, category.seed_query(), tracks.clone())
            .await;
        BrowseOutcome::Tracks { category, tracks }
    }

    /// `/stats`, admin only
    pub async fn stats_report(&self, requester: &ChatUser) -> StatsOutcome {
        if self.admin_id != Some(requester.id) {
            log::warn!("🚫 /stats denied for {}", requester.id.0);
            return StatsOutcome::Forbidden;
        }
        StatsOutcome::Report(self.stats.report(TOP_USERS_LIMIT).await)
    }
}
