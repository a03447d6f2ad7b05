//! Wires the pipeline together: poller -> enrichment -> filters.
//!
//! `OutageApp` is the single object the presentation layer talks to. It
//! owns the outage poller, the geocode queue, and the enrichment
//! coordinator, and derives the displayed view on demand.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::{GeocodeClient, GeocodeSource, OutageClient, OutageSource};
use crate::cache::{FileStore, KvStore};
use crate::config::Config;
use crate::enrich::{EnrichmentCoordinator, Progress};
use crate::filters::{apply_filters, FilterOptions};
use crate::geocode::GeocodeService;
use crate::models::{Address, Outage};
use crate::poller::OutagePoller;
use crate::stats::OutageStats;

#[derive(Clone)]
pub struct OutageApp {
    poller: OutagePoller,
    enricher: EnrichmentCoordinator,
    poll_interval: std::time::Duration,
}

/// Keeps the background refresh loop alive; aborts it when dropped so a
/// torn-down view cannot leave a timer running.
pub struct PollerHandle {
    handle: JoinHandle<()>,
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl OutageApp {
    pub fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn KvStore> = Arc::new(FileStore::new(config.cache_dir()?)?);
        let outage_source: Arc<dyn OutageSource> =
            Arc::new(OutageClient::new(&config.outage_base_url)?);
        let geocode_source: Arc<dyn GeocodeSource> =
            Arc::new(GeocodeClient::new(&config.geocode_url, &config.user_agent)?);

        Ok(Self::with_sources(config, outage_source, geocode_source, store))
    }

    /// Assemble the pipeline from explicit collaborators (tests inject
    /// fakes here).
    pub fn with_sources(
        config: &Config,
        outage_source: Arc<dyn OutageSource>,
        geocode_source: Arc<dyn GeocodeSource>,
        store: Arc<dyn KvStore>,
    ) -> Self {
        let poller = OutagePoller::new(outage_source, store.clone(), config.outage_cache_ttl());
        let geocoder = GeocodeService::new(
            geocode_source,
            store,
            config.geocode_min_interval(),
            config.geocode_cache_ttl(),
        );
        let enricher = EnrichmentCoordinator::new(geocoder);

        Self {
            poller,
            enricher,
            poll_interval: config.poll_interval(),
        }
    }

    /// Load the outage list (cache-first unless `skip_cache`) and enrich
    /// the next batch of addresses.
    pub async fn load(&self, skip_cache: bool) {
        self.poller.load(skip_cache).await;
        self.enricher.enrich(&self.poller.outages()).await;
    }

    /// User-triggered refresh; always hits the network.
    pub async fn refetch(&self) {
        self.load(true).await;
    }

    /// Spawn the background refresh loop: a forced reload plus enrichment
    /// every poll interval, for as long as the returned handle lives.
    pub fn start(&self) -> PollerHandle {
        let app = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(app.poll_interval);
            // The immediate first tick is the initial load's job, not ours
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!("Background refresh tick");
                app.load(true).await;
            }
        });
        PollerHandle { handle }
    }

    /// The displayed view: status filter, text search, then sort.
    pub fn view(&self, options: &FilterOptions) -> Vec<Outage> {
        apply_filters(&self.poller.outages(), options, &self.enricher.addresses())
    }

    pub fn outages(&self) -> Vec<Outage> {
        self.poller.outages()
    }

    pub fn stats(&self) -> OutageStats {
        OutageStats::compute(&self.poller.outages())
    }

    pub fn address(&self, outage_id: &str) -> Option<Address> {
        self.enricher.address(outage_id)
    }

    pub fn error(&self) -> Option<String> {
        self.poller.error()
    }

    /// A poll failure is only headline news before any data has been
    /// shown; afterwards the stale `last_updated` is the signal.
    pub fn first_load_failed(&self) -> bool {
        !self.poller.has_data() && self.poller.error().is_some()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.poller.last_updated()
    }

    pub fn enrichment_progress(&self) -> Progress {
        self.enricher.progress()
    }

    pub fn is_enriching(&self) -> bool {
        self.enricher.is_loading()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::api::ApiError;
    use crate::cache::store::MemoryStore;
    use crate::filters::SortBy;

    use super::*;

    struct FakeFeed {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OutageSource for FakeFeed {
        async fn fetch(&self) -> Result<Vec<Outage>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Outage {
                    id: "1".to_string(),
                    identifier: None,
                    status: Some("Unassigned".to_string()),
                    num_people: 100,
                    latitude: Some(36.1),
                    longitude: Some(-86.7),
                    start_time: None,
                    last_updated_time: None,
                    cause: None,
                },
                Outage {
                    id: "2".to_string(),
                    identifier: None,
                    status: Some("Assigned".to_string()),
                    num_people: 500,
                    latitude: Some(36.2),
                    longitude: Some(-86.8),
                    start_time: None,
                    last_updated_time: None,
                    cause: None,
                },
            ])
        }
    }

    struct FakeGeocoder;

    #[async_trait]
    impl GeocodeSource for FakeGeocoder {
        async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Address, ApiError> {
            Ok(Address {
                street: "Woodland St".to_string(),
                city: "Nashville".to_string(),
                state: "TN".to_string(),
                zip: "37206".to_string(),
                ..Address::default()
            })
        }
    }

    fn app() -> (OutageApp, Arc<FakeFeed>) {
        let feed = Arc::new(FakeFeed {
            calls: AtomicUsize::new(0),
        });
        let config = Config::default();
        let app = OutageApp::with_sources(
            &config,
            feed.clone(),
            Arc::new(FakeGeocoder),
            Arc::new(MemoryStore::new()),
        );
        (app, feed)
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_enriches_most_affected() {
        let (app, _) = app();
        app.load(true).await;

        assert_eq!(app.outages().len(), 2);
        let addr = app.address("2").unwrap();
        assert_eq!(addr.zip, "37206");
        assert_eq!(app.enrichment_progress().total, 2);
        assert!(app.last_updated().is_some());
        assert!(!app.first_load_failed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_applies_pipeline() {
        let (app, _) = app();
        app.load(true).await;

        let options = FilterOptions {
            query: String::new(),
            status: "all".to_string(),
            sort_by: SortBy::MostAffected,
        };
        let view = app.view(&options);
        assert_eq!(view[0].id, "2");

        // Search by enriched zip reaches both outages' addresses
        let options = FilterOptions {
            query: "37206".to_string(),
            ..options
        };
        assert_eq!(app.view(&options).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_loop_polls_on_interval() {
        let (app, feed) = app();
        app.load(true).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 1);

        let handle = app.start();
        tokio::time::sleep(std::time::Duration::from_secs(181)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);

        // Teardown cancels the timer
        drop(handle);
        tokio::time::sleep(std::time::Duration::from_secs(600)).await;
        assert_eq!(feed.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_from_snapshot() {
        let (app, _) = app();
        app.load(true).await;

        let stats = app.stats();
        assert_eq!(stats.total_outages, 2);
        assert_eq!(stats.total_affected, 600);
        assert_eq!(stats.unassigned, 1);
        assert_eq!(stats.assigned, 1);
    }
}
