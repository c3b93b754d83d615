use crate::components::class_sessions::{RawSession, SessionBackend};
use crate::error::AppResult;
use crate::utils::time::WeekWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// An authoritative copy of the session list at one point in time
#[derive(Debug, Clone)]
pub struct CacheSnapshot {
    /// Increases by one with every successful fetch
    pub generation: u64,
    pub sessions: Arc<Vec<RawSession>>,
}

#[derive(Debug, Default)]
struct CacheState {
    sessions: Option<Arc<Vec<RawSession>>>,
    generation: u64,
    stale: bool,
    scope: Option<WeekWindow>,
    fetched_at: Option<Instant>,
}

impl CacheState {
    fn fresh_snapshot(&self) -> Option<CacheSnapshot> {
        match (&self.sessions, self.stale) {
            (Some(sessions), false) => Some(CacheSnapshot {
                generation: self.generation,
                sessions: Arc::clone(sessions),
            }),
            _ => None,
        }
    }
}

/// Shared cache of the backend session list.
///
/// The only writer is a successful fetch. Mutations elsewhere call
/// [`SessionCache::invalidate`]; the next [`SessionCache::get`] refetches and
/// subscribers are told an invalidation happened. Concurrent refetches are
/// collapsed into one backend call.
#[derive(Clone)]
pub struct SessionCache {
    backend: Arc<dyn SessionBackend>,
    state: Arc<RwLock<CacheState>>,
    fetch_lock: Arc<Mutex<()>>,
    invalidations: Arc<watch::Sender<u64>>,
}

impl SessionCache {
    /// Create an empty cache over the whole session list
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        let (invalidations, _) = watch::channel(0);
        Self {
            backend,
            state: Arc::new(RwLock::new(CacheState::default())),
            fetch_lock: Arc::new(Mutex::new(())),
            invalidations: Arc::new(invalidations),
        }
    }

    /// Change the fetch scope; a different scope invalidates the cache.
    ///
    /// Returns whether the scope changed.
    pub async fn set_scope(&self, window: Option<WeekWindow>) -> bool {
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.scope != window;
            state.scope = window;
            changed
        };
        if changed {
            debug!(
                "Session cache scope changed to {:?}",
                window.map(|w| w.date_range())
            );
            self.invalidate().await;
        }
        changed
    }

    /// Invalidate the cache if its last fetch is at least `max_age` old.
    ///
    /// Returns whether the cache now needs a refetch. An empty or already
    /// invalidated cache needs one but is not invalidated again.
    pub async fn expire(&self, max_age: Duration) -> bool {
        let expired = {
            let state = self.state.read().await;
            if state.stale || state.sessions.is_none() {
                return true;
            }
            state
                .fetched_at
                .map_or(true, |fetched_at| fetched_at.elapsed() >= max_age)
        };
        if expired {
            self.invalidate().await;
        }
        expired
    }

    /// Current snapshot, fetching first when empty or invalidated
    pub async fn get(&self) -> AppResult<CacheSnapshot> {
        if let Some(snapshot) = self.state.read().await.fresh_snapshot() {
            return Ok(snapshot);
        }

        let _fetching = self.fetch_lock.lock().await;
        let scope = {
            let state = self.state.read().await;
            // Refreshed by whoever held the lock before us
            if let Some(snapshot) = state.fresh_snapshot() {
                return Ok(snapshot);
            }
            state.scope
        };

        let sessions = match self.backend.list_sessions(scope).await {
            Ok(sessions) => Arc::new(sessions),
            Err(e) => {
                // Keep serving nothing new; the cache stays stale for the next caller
                warn!("Session list refetch failed: {}", e);
                return Err(e);
            }
        };

        let mut state = self.state.write().await;
        state.generation += 1;
        state.sessions = Some(Arc::clone(&sessions));
        state.stale = false;
        state.fetched_at = Some(Instant::now());
        debug!(
            "Session cache refreshed to generation {} ({} sessions)",
            state.generation,
            sessions.len()
        );

        Ok(CacheSnapshot {
            generation: state.generation,
            sessions,
        })
    }

    /// Last fetched snapshot without touching the backend
    pub async fn peek(&self) -> Option<CacheSnapshot> {
        let state = self.state.read().await;
        state.sessions.as_ref().map(|sessions| CacheSnapshot {
            generation: state.generation,
            sessions: Arc::clone(sessions),
        })
    }

    /// Mark the cached list as outdated and notify subscribers
    pub async fn invalidate(&self) {
        self.state.write().await.stale = true;
        self.invalidations.send_modify(|count| *count += 1);
        info!("Session cache invalidated");
    }

    pub async fn is_stale(&self) -> bool {
        let state = self.state.read().await;
        state.stale || state.sessions.is_none()
    }

    /// Receiver that changes on every invalidation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.invalidations.subscribe()
    }
}
