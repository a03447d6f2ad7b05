//! Application configuration management.
//!
//! Configuration is stored at `~/.config/outagewatch/config.json`; every
//! field has a default so a missing file just means stock settings. The
//! cache lives under the platform cache directory.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "outagewatch";

/// Config file name
const CONFIG_FILE: &str = "config.json";

fn default_outage_base_url() -> String {
    "https://utilisocial.io/datacapable/v2/p/NES".to_string()
}

fn default_geocode_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_user_agent() -> String {
    "outagewatch/0.2 (NES outage map client)".to_string()
}

fn default_poll_interval_secs() -> u64 {
    180
}

fn default_outage_cache_ttl_secs() -> i64 {
    300
}

fn default_geocode_cache_ttl_days() -> i64 {
    7
}

fn default_geocode_min_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_outage_base_url")]
    pub outage_base_url: String,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    /// Sent on every geocode request; Nominatim's usage policy requires a
    /// descriptive client identifier.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Background refresh cadence. Kept shorter than the snapshot TTL so a
    /// live refresh always lands before the cache could go stale.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_outage_cache_ttl_secs")]
    pub outage_cache_ttl_secs: i64,
    #[serde(default = "default_geocode_cache_ttl_days")]
    pub geocode_cache_ttl_days: i64,
    #[serde(default = "default_geocode_min_interval_ms")]
    pub geocode_min_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        // Round-trips through serde so the field defaults stay the single
        // source of truth
        serde_json::from_str("{}").expect("defaults are valid")
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn outage_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.outage_cache_ttl_secs)
    }

    pub fn geocode_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.geocode_cache_ttl_days)
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    pub fn geocode_min_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.geocode_min_interval_ms)
    }
}
