//! HTTP clients for the two remote services the app depends on.
//!
//! - `OutageClient`: the NES/DataCapable map feed (full outage snapshots)
//! - `GeocodeClient`: OpenStreetMap Nominatim reverse geocoding
//!
//! Both are exposed behind traits so the cache, queue, and poller layers
//! can be driven by in-memory fakes in tests.

pub mod error;
pub mod geocode;
pub mod outages;

pub use error::ApiError;
pub use geocode::{GeocodeClient, GeocodeSource};
pub use outages::{OutageClient, OutageSource};
