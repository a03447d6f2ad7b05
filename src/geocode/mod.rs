//! Reverse-geocoding cache and request queue.
//!
//! Nominatim allows at most one request per second process-wide, so all
//! lookups funnel through a single worker task that drains a FIFO queue
//! and spaces remote calls by the configured minimum interval. Results are
//! persisted for seven days keyed by the coordinate rounded to five
//! decimal places (~1.1m), so any two outages at the same rounded spot
//! share one cache entry.
//!
//! Concurrent callers asking for the same not-yet-cached coordinate each
//! get their own queue entry; collapsing duplicates per outage id is the
//! enrichment coordinator's job, not this layer's.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::{ApiError, GeocodeSource};
use crate::cache::{KvStore, GEOCODE_KEY};
use crate::models::Address;

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Geocoding queue is shut down")]
    QueueClosed,
}

/// One persisted geocode result. Flattened so the stored JSON is the
/// address object plus a timestamp, matching the cache's on-disk history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeocodeEntry {
    #[serde(flatten)]
    address: Address,
    timestamp: DateTime<Utc>,
}

struct GeocodeJob {
    lat: f64,
    lon: f64,
    key: String,
    reply: oneshot::Sender<Result<Address, ApiError>>,
}

/// Handle to the geocoding pipeline.
///
/// Constructed once and shared; dropping every clone closes the queue and
/// lets the worker exit after finishing in-flight work. Requests already
/// queued are not cancelled by caller teardown - completed lookups still
/// land in the process-wide cache for future views.
#[derive(Clone)]
pub struct GeocodeService {
    tx: mpsc::UnboundedSender<GeocodeJob>,
    store: Arc<dyn KvStore>,
    ttl: chrono::Duration,
}

impl GeocodeService {
    pub fn new(
        source: Arc<dyn GeocodeSource>,
        store: Arc<dyn KvStore>,
        min_interval: Duration,
        ttl: chrono::Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker_store = store.clone();
        tokio::spawn(async move {
            run_worker(rx, source, worker_store, min_interval).await;
        });

        Self { tx, store, ttl }
    }

    /// Resolve a coordinate to an address.
    ///
    /// A fresh cache entry resolves immediately without touching the
    /// queue; otherwise the request waits its turn behind earlier ones.
    /// Failed lookups are not cached, so a later call for the same
    /// coordinate will try the remote service again.
    pub async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<Address, GeocodeError> {
        let key = cache_key(lat, lon);

        if let Some(entry) = load_cache(self.store.as_ref()).get(&key) {
            if Utc::now() - entry.timestamp < self.ttl {
                debug!(key = %key, "Geocode cache hit");
                return Ok(entry.address.clone());
            }
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(GeocodeJob {
                lat,
                lon,
                key,
                reply: reply_tx,
            })
            .map_err(|_| GeocodeError::QueueClosed)?;

        match reply_rx.await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GeocodeError::QueueClosed),
        }
    }
}

/// Single consumer: drains jobs strictly in submission order, spacing
/// remote calls by `min_interval`. The stamp is taken when a call is
/// issued, so failed calls count toward the spacing too.
async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<GeocodeJob>,
    source: Arc<dyn GeocodeSource>,
    store: Arc<dyn KvStore>,
    min_interval: Duration,
) {
    let mut last_call: Option<Instant> = None;

    while let Some(job) = rx.recv().await {
        if let Some(last) = last_call {
            let elapsed = last.elapsed();
            if elapsed < min_interval {
                tokio::time::sleep(min_interval - elapsed).await;
            }
        }

        last_call = Some(Instant::now());
        let result = source.reverse(job.lat, job.lon).await;

        match &result {
            Ok(address) => {
                write_entry(store.as_ref(), &job.key, address);
            }
            Err(e) => {
                warn!(key = %job.key, error = %e, "Geocode lookup failed");
            }
        }

        // Caller may have gone away; the cache write above already happened.
        let _ = job.reply.send(result);
    }

    debug!("Geocode worker shutting down");
}

/// Round to 5 decimal places (~1.1m), the cache's identity for a location.
fn cache_key(lat: f64, lon: f64) -> String {
    format!("{:.5},{:.5}", lat, lon)
}

fn load_cache(store: &dyn KvStore) -> HashMap<String, GeocodeEntry> {
    let blob = match store.get(GEOCODE_KEY) {
        Ok(Some(blob)) => blob,
        Ok(None) => return HashMap::new(),
        Err(e) => {
            debug!(error = %e, "Geocode cache read failed, starting empty");
            return HashMap::new();
        }
    };

    serde_json::from_str(&blob).unwrap_or_else(|e| {
        warn!(error = %e, "Corrupt geocode cache, starting empty");
        HashMap::new()
    })
}

/// Read-merge-write of the whole cache object. Only the worker writes, so
/// per-entry updates cannot race each other.
fn write_entry(store: &dyn KvStore, key: &str, address: &Address) {
    let mut cache = load_cache(store);
    cache.insert(
        key.to_string(),
        GeocodeEntry {
            address: address.clone(),
            timestamp: Utc::now(),
        },
    );

    match serde_json::to_string(&cache) {
        Ok(blob) => {
            if let Err(e) = store.set(GEOCODE_KEY, &blob) {
                warn!(error = %e, "Failed to persist geocode cache");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize geocode cache"),
    }
}
