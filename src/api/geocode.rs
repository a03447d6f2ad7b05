//! Reverse-geocoding client for OpenStreetMap Nominatim.
//!
//! Nominatim's usage policy requires a descriptive User-Agent and at most
//! one request per second. The client itself only identifies the app; the
//! pacing is enforced upstream by the geocode queue, which owns the single
//! request pipeline.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::models::Address;

use super::ApiError;

/// Source of reverse-geocode lookups. Implemented by `GeocodeClient` for
/// Nominatim and by fakes in tests.
#[async_trait]
pub trait GeocodeSource: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Address, ApiError>;
}

#[derive(Clone)]
pub struct GeocodeClient {
    client: Client,
    reverse_url: String,
    user_agent: String,
}

impl GeocodeClient {
    pub fn new(reverse_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        Ok(Self {
            client: Client::builder().build()?,
            reverse_url: reverse_url.to_string(),
            user_agent: user_agent.to_string(),
        })
    }
}

#[async_trait]
impl GeocodeSource for GeocodeClient {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Address, ApiError> {
        debug!(lat, lon, "Reverse geocoding");

        let response = self
            .client
            .get(&self.reverse_url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let payload: NominatimResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Malformed geocode response: {}", e)))?;

        Ok(payload.into_address())
    }
}

#[derive(Debug, Default, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    address: NominatimAddress,
}

/// The subset of Nominatim address fields the app cares about. Which fields
/// are populated varies by location type, hence the fallback chains below.
#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    road: Option<String>,
    street: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    postcode: Option<String>,
    neighbourhood: Option<String>,
    suburb: Option<String>,
}

impl NominatimResponse {
    fn into_address(self) -> Address {
        let formatted = self.address.formatted();
        let a = self.address;
        Address {
            street: a.road.or(a.street).unwrap_or_default(),
            city: a
                .city
                .or(a.town)
                .or(a.village)
                .unwrap_or_else(|| "Nashville".to_string()),
            state: a.state.unwrap_or_else(|| "TN".to_string()),
            zip: a.postcode.unwrap_or_default(),
            neighborhood: a.neighbourhood.or(a.suburb).unwrap_or_default(),
            display_name: self.display_name,
            formatted,
        }
    }
}

impl NominatimAddress {
    /// Compose a short display line: street (or neighborhood), city, zip.
    fn formatted(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();

        if let Some(street) = self.road.as_deref().or(self.street.as_deref()) {
            parts.push(street);
        } else if let Some(hood) = self.neighbourhood.as_deref().or(self.suburb.as_deref()) {
            parts.push(hood);
        }

        if let Some(city) = self
            .city
            .as_deref()
            .or(self.town.as_deref())
            .or(self.village.as_deref())
        {
            parts.push(city);
        }

        if let Some(zip) = self.postcode.as_deref() {
            parts.push(zip);
        }

        if parts.is_empty() {
            "Nashville, TN".to_string()
        } else {
            parts.join(", ")
        }
    }
}
