use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use super::KvStore;

/// A value paired with the time it was cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cached<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.timestamp
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }
}

/// Typed read-through cache over one store key.
///
/// Read errors (missing file, corrupt JSON) degrade to a miss so a bad
/// cache can never take the app down; write errors are logged and dropped.
pub struct SnapshotCache<T> {
    store: Arc<dyn KvStore>,
    key: &'static str,
    _marker: PhantomData<T>,
}

impl<T: Serialize + DeserializeOwned> SnapshotCache<T> {
    pub fn new(store: Arc<dyn KvStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    pub fn load(&self) -> Option<Cached<T>> {
        let blob = match self.store.get(self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                debug!(key = self.key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&blob) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(key = self.key, error = %e, "Corrupt cache entry, treating as miss");
                None
            }
        }
    }

    /// Best-effort write; a failure is logged, never surfaced.
    pub fn save(&self, data: &T) {
        let cached = Cached {
            data,
            timestamp: Utc::now(),
        };
        let blob = match serde_json::to_string(&cached) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(key = self.key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(self.key, &blob) {
            warn!(key = self.key, error = %e, "Failed to write cache entry");
        }
    }
}
