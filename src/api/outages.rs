//! Client for the NES outage map feed.
//!
//! The feed is a single unauthenticated endpoint returning the complete
//! current snapshot of outage events; there is no pagination or delta API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::models::Outage;

use super::ApiError;

/// HTTP request timeout in seconds.
/// The feed normally answers in well under a second; 10s covers slow
/// upstream moments while still failing fast enough for a polling loop.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Source of outage snapshots. Implemented by `OutageClient` for the real
/// feed and by in-memory fakes in tests.
#[async_trait]
pub trait OutageSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Outage>, ApiError>;
}

/// Client for the outage map feed.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct OutageClient {
    client: Client,
    events_url: String,
}

impl OutageClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            events_url: format!("{}/map/events", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl OutageSource for OutageClient {
    async fn fetch(&self) -> Result<Vec<Outage>, ApiError> {
        debug!(url = %self.events_url, "Fetching outage snapshot");

        let response = self.client.get(&self.events_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let outages: Vec<Outage> = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed outage feed: {}", e)))?;

        debug!(count = outages.len(), "Outage snapshot received");
        Ok(outages)
    }
}
