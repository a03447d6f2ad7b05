//! Persistent caching.
//!
//! Two independent caches share one key-value store under disjoint keys:
//! the outage snapshot (written by the poller, 5 minute TTL) and the
//! geocode results (written by the geocode queue, 7 day TTL). Writes are
//! best-effort everywhere; a failed write never blocks the in-memory path.

pub mod snapshot;
pub mod store;

pub use snapshot::{Cached, SnapshotCache};
pub use store::{FileStore, KvStore};

/// Store key for the outage snapshot cache.
pub const OUTAGES_KEY: &str = "outages";

/// Store key for the geocode result cache.
pub const GEOCODE_KEY: &str = "geocode";
