//! Tracker configuration.
//!
//! Stored as a JSON object on disk; every key is optional:
//! ```json
//! {
//!   "endpoint": "http://feeds.example.org/XML/_System.php",
//!   "poll_interval_secs": 10,
//!   "connect_timeout_ms": 15000,
//!   "read_timeout_ms": 10000
//! }
//! ```
//! The `BUS_FEED_URL` environment variable overrides the file's endpoint.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 10_000;

pub const ENDPOINT_ENV: &str = "BUS_FEED_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub endpoint: Option<String>,
    pub poll_interval_secs: u64,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

/// Connection bounds applied to every feed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTimeouts {
    pub connect: Duration,
    pub read: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        TrackerConfig::default().timeouts()
    }
}

impl TrackerConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("Invalid config file '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Replaces the endpoint with `BUS_FEED_URL` when that variable is set.
    pub fn with_env(self) -> Self {
        self.with_endpoint_override(std::env::var(ENDPOINT_ENV).ok())
    }

    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = Some(endpoint);
        }
        self
    }

    pub fn with_poll_interval_override(mut self, secs: Option<u64>) -> Self {
        if let Some(secs) = secs {
            self.poll_interval_secs = secs;
        }
        self
    }

    /// The configured endpoint, or an error naming every place it could be set.
    pub fn require_endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No feed endpoint configured: pass --endpoint, set {ENDPOINT_ENV}, or add \"endpoint\" to the config file"
            )
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn timeouts(&self) -> FetchTimeouts {
        FetchTimeouts {
            connect: Duration::from_millis(self.connect_timeout_ms),
            read: Duration::from_millis(self.read_timeout_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.poll_interval(), Duration::from_secs(10));
        assert_eq!(config.timeouts().connect, Duration::from_millis(15_000));
        assert_eq!(config.timeouts().read, Duration::from_millis(10_000));
        assert!(config.require_endpoint().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            TrackerConfig::from_json(r#"{"endpoint": "http://localhost/feed.xml", "read_timeout_ms": 500}"#)
                .unwrap();
        assert_eq!(config.require_endpoint().unwrap(), "http://localhost/feed.xml");
        assert_eq!(config.timeouts().read, Duration::from_millis(500));
        assert_eq!(config.poll_interval_secs, DEFAULT_POLL_INTERVAL_SECS);
    }

    #[test]
    fn test_invalid_json() {
        assert!(TrackerConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_overrides() {
        let config = TrackerConfig::default()
            .with_endpoint_override(Some("http://a/feed".to_string()))
            .with_endpoint_override(Some("   ".to_string()))
            .with_endpoint_override(None)
            .with_poll_interval_override(Some(3));
        assert_eq!(config.endpoint.as_deref(), Some("http://a/feed"));
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_missing_file() {
        let err = TrackerConfig::load("/nonexistent/bus_tracker.json").unwrap_err();
        assert!(err.to_string().contains("bus_tracker.json"));
    }
}
