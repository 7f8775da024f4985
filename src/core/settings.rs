use std::{path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

/// Json struct for process settings. Every field is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    pub web_port: Option<u16>,
    pub airtable_url: Option<String>,
    pub airtable_base_id: Option<String>,
    pub airtable_api_key: Option<String>,
    pub startgg_url: Option<String>,
    pub startgg_api_key: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub request_retries: Option<u32>,
    pub event_cache_ttl_secs: Option<u64>,
    pub subscriber_queue_capacity: Option<usize>,
    pub keepalive_secs: Option<u64>,
}

impl Settings {
    pub fn load(file: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read settings file {}", file.display()))?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn web_port(&self) -> u16 {
        self.web_port.unwrap_or(8000)
    }

    pub fn airtable_url(&self) -> &str {
        self.airtable_url
            .as_deref()
            .unwrap_or("https://api.airtable.com/v0")
    }

    /// Base id and API key, both required.
    pub fn airtable_credentials(&self) -> anyhow::Result<(&str, &str)> {
        let base_id = self
            .airtable_base_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(anyhow!("Missing record store base id (AIRTABLE_BASE_ID)"))?;
        let api_key = self
            .airtable_api_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(anyhow!("Missing record store API key (AIRTABLE_API_KEY)"))?;
        Ok((base_id, api_key))
    }

    pub fn startgg_url(&self) -> &str {
        self.startgg_url
            .as_deref()
            .unwrap_or("https://api.start.gg/gql/alpha")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(20))
    }

    pub fn request_retries(&self) -> u32 {
        self.request_retries.unwrap_or(3)
    }

    pub fn event_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.event_cache_ttl_secs.unwrap_or(300))
    }

    pub fn subscriber_queue_capacity(&self) -> usize {
        self.subscriber_queue_capacity.unwrap_or(32)
    }

    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs.unwrap_or(30))
    }
}
