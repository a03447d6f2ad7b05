//! Drives reverse geocoding for the outages most worth labeling.
//!
//! Each refresh can surface dozens of outages, but Nominatim only allows
//! one lookup per second, so the coordinator enriches the 20 most-affected
//! outages per batch and remembers which ids it has already attempted this
//! session. An attempted outage always ends up with an address: the real
//! one on success, the Nashville fallback on failure.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::geocode::GeocodeService;
use crate::models::{Address, Outage};

/// How many outages to enrich per batch. At one request per second a full
/// batch of cache misses takes ~20s, which keeps the first addresses
/// appearing quickly while the long tail stays un-geocoded.
const BATCH_SIZE: usize = 20;

/// Progress over the batch currently being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
}

#[derive(Default)]
struct EnrichState {
    addresses: HashMap<String, Address>,
    attempted: HashSet<String>,
    progress: Progress,
    loading: bool,
}

#[derive(Clone)]
pub struct EnrichmentCoordinator {
    geocoder: GeocodeService,
    batch_size: usize,
    state: Arc<Mutex<EnrichState>>,
}

impl EnrichmentCoordinator {
    pub fn new(geocoder: GeocodeService) -> Self {
        Self::with_batch_size(geocoder, BATCH_SIZE)
    }

    pub fn with_batch_size(geocoder: GeocodeService, batch_size: usize) -> Self {
        Self {
            geocoder,
            batch_size,
            state: Arc::new(Mutex::new(EnrichState::default())),
        }
    }

    /// Enrich the next batch from a fresh outage snapshot.
    ///
    /// Picks up to `batch_size` outages that have not been attempted this
    /// session, most-affected first (ties keep snapshot order), and
    /// resolves each one with coordinates through the geocode queue.
    /// Every selected id is marked attempted - success, failure, or no
    /// coordinates - so re-renders and later snapshots never re-request it.
    pub async fn enrich(&self, outages: &[Outage]) {
        let batch = self.select_batch(outages);
        if batch.is_empty() {
            return;
        }

        {
            let mut state = self.state.lock().unwrap();
            state.loading = true;
            state.progress = Progress {
                current: 0,
                total: batch.len(),
            };
        }

        for outage in &batch {
            if let (Some(lat), Some(lon)) = (outage.latitude, outage.longitude) {
                let address = match self.geocoder.reverse_geocode(lat, lon).await {
                    Ok(address) => address,
                    Err(e) => {
                        warn!(id = %outage.id, error = %e, "Geocode failed, using fallback");
                        Address::fallback()
                    }
                };
                let mut state = self.state.lock().unwrap();
                state.addresses.insert(outage.id.clone(), address);
            }

            let mut state = self.state.lock().unwrap();
            state.attempted.insert(outage.id.clone());
            state.progress.current += 1;
        }

        let mut state = self.state.lock().unwrap();
        state.loading = false;
        debug!(batch = batch.len(), total = state.addresses.len(), "Enrichment batch done");
    }

    fn select_batch(&self, outages: &[Outage]) -> Vec<Outage> {
        let state = self.state.lock().unwrap();
        let mut candidates: Vec<Outage> = outages
            .iter()
            .filter(|o| !state.attempted.contains(&o.id))
            .cloned()
            .collect();
        // Stable sort: ties keep their snapshot order
        candidates.sort_by(|a, b| b.num_people.cmp(&a.num_people));
        candidates.truncate(self.batch_size);
        candidates
    }

    /// Pure lookup into the accumulated address map.
    pub fn address(&self, outage_id: &str) -> Option<Address> {
        self.state.lock().unwrap().addresses.get(outage_id).cloned()
    }

    pub fn addresses(&self) -> HashMap<String, Address> {
        self.state.lock().unwrap().addresses.clone()
    }

    pub fn progress(&self) -> Progress {
        self.state.lock().unwrap().progress
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().unwrap().loading
    }

    /// Forget everything attempted this session. Called when the outage
    /// list identity changes (e.g. the app is pointed at a different
    /// utility), not on ordinary snapshot refreshes.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.addresses.clear();
        state.attempted.clear();
        state.progress = Progress::default();
        state.loading = false;
    }
}
