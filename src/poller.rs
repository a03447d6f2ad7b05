//! Outage snapshot cache and refresh logic.
//!
//! The poller owns the authoritative in-memory outage list, backed by a
//! 5 minute persistent cache. The app-level refresh loop calls
//! `load(true)` every 3 minutes - intentionally inside the cache TTL, so a
//! live refresh always lands before cached data could go stale, while a
//! cold start within the window still renders instantly from disk.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::api::OutageSource;
use crate::cache::{KvStore, SnapshotCache, OUTAGES_KEY};
use crate::models::Outage;

#[derive(Debug, Clone, Default)]
struct PollState {
    outages: Vec<Outage>,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
    loading: bool,
}

#[derive(Clone)]
pub struct OutagePoller {
    source: Arc<dyn OutageSource>,
    cache: Arc<SnapshotCache<Vec<Outage>>>,
    cache_ttl: Duration,
    state: Arc<RwLock<PollState>>,
}

impl OutagePoller {
    pub fn new(source: Arc<dyn OutageSource>, store: Arc<dyn KvStore>, cache_ttl: Duration) -> Self {
        Self {
            source,
            cache: Arc::new(SnapshotCache::new(store, OUTAGES_KEY)),
            cache_ttl,
            state: Arc::new(RwLock::new(PollState::default())),
        }
    }

    /// Refresh the outage list.
    ///
    /// With `skip_cache == false` a non-expired snapshot is served straight
    /// from disk with no network call. Otherwise the feed is fetched: on
    /// success the in-memory set is replaced wholesale (absent records are
    /// gone - the outage was resolved), the snapshot is persisted
    /// best-effort, and any prior error is cleared. On failure the
    /// in-memory set is left untouched and an error descriptor is recorded
    /// for the presentation layer; the next tick or manual refresh retries.
    pub async fn load(&self, skip_cache: bool) {
        if !skip_cache {
            if let Some(cached) = self.cache.load() {
                if !cached.is_expired(self.cache_ttl) {
                    debug!(age_secs = cached.age().num_seconds(), "Serving outages from cache");
                    let mut state = self.state.write().unwrap();
                    state.outages = cached.data;
                    state.last_updated = Some(cached.timestamp);
                    state.loading = false;
                    return;
                }
            }
        }

        self.state.write().unwrap().loading = true;

        match self.source.fetch().await {
            Ok(outages) => {
                info!(count = outages.len(), "Outage snapshot refreshed");
                self.cache.save(&outages);
                let mut state = self.state.write().unwrap();
                state.outages = outages;
                state.last_updated = Some(Utc::now());
                state.error = None;
                state.loading = false;
            }
            Err(e) => {
                warn!(error = %e, "Outage refresh failed");
                let mut state = self.state.write().unwrap();
                state.error = Some(e.to_string());
                state.loading = false;
            }
        }
    }

    /// Explicit user-triggered refresh, always bypassing the cache.
    pub async fn refetch(&self) {
        self.load(true).await;
    }

    pub fn outages(&self) -> Vec<Outage> {
        self.state.read().unwrap().outages.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.state.read().unwrap().last_updated
    }

    /// The most recent refresh failure, if any. Cleared by the next
    /// successful load. Only a first-load failure (no data yet) should be
    /// the headline; after that a stalled `last_updated` is the signal.
    pub fn error(&self) -> Option<String> {
        self.state.read().unwrap().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().unwrap().loading
    }

    pub fn has_data(&self) -> bool {
        !self.state.read().unwrap().outages.is_empty()
    }
}
