use serde::{Deserialize, Serialize};

/// A reverse-geocoded address, keyed by outage id once resolved.
///
/// Produced once per outage and never mutated afterwards; the geocode cache
/// may rebuild one after its TTL lapses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub neighborhood: String,
    /// Full display name as returned by the geocoder.
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    /// Short single-line rendering for lists and cards.
    #[serde(default)]
    pub formatted: String,
}

impl Address {
    /// Placeholder used when a lookup fails, so the presentation layer
    /// always has something to show for an attempted outage.
    pub fn fallback() -> Self {
        Self {
            city: "Nashville".to_string(),
            state: "TN".to_string(),
            formatted: "Nashville, TN".to_string(),
            ..Self::default()
        }
    }
}
