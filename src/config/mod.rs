use serde::Deserialize;
use std::time::Duration;

use crate::services::poller::PollSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the image-generation service
    pub generation_api_url: String,

    /// Bearer token for the image-generation service
    pub generation_api_token: String,

    /// Object storage bucket name
    pub storage_bucket: String,

    /// S3-compatible endpoint URL
    pub storage_endpoint: String,

    /// S3 access key ID
    pub storage_access_key: String,

    /// S3 secret access key
    pub storage_secret_key: String,

    /// Public URL prefix that serves objects from the bucket
    pub storage_public_base_url: String,

    /// Branding overlay drawn on top of every generated image
    #[serde(default = "default_overlay_path")]
    pub overlay_path: String,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Consecutive transient poll failures tolerated before giving up (0 = abort on first)
    #[serde(default)]
    pub poll_max_transient_failures: u32,

    /// Per-request timeout for upstream HTTP calls
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_overlay_path() -> String {
    "assets/Booth_overlay_PRE1.png".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_poll_timeout_ms() -> u64 {
    60_000
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: Duration::from_millis(self.poll_timeout_ms),
            max_transient_failures: self.poll_max_transient_failures,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
