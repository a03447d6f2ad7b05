//! Data models for NES outage map entities.
//!
//! - `Outage`: one service-interruption record from the map feed
//! - `Address`: a reverse-geocoded street address for an outage

pub mod address;
pub mod outage;

pub use address::Address;
pub use outage::Outage;
