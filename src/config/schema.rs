//! Configuration schema definitions.
//!
//! This module defines the settings a sync client needs to talk to the
//! config server. All types derive Serde traits for deserialization from
//! TOML files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the sync client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the config server (e.g., "http://localhost:8080").
    pub config_server_url: String,

    /// Application identifier registered on the config server.
    pub app_id: String,

    /// Cluster to read configuration overrides from.
    pub cluster_name: String,

    /// Shared secret for signed access. Requests are unsigned when absent.
    pub secret: Option<String>,

    /// Namespaces the daemon subscribes to on startup.
    pub namespaces: Vec<String>,

    /// Client IP forwarded for per-client (canary) routing.
    pub client_ip: Option<String>,

    /// Long-poll settings.
    pub poll: PollConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            config_server_url: "http://localhost:8080".to_string(),
            app_id: String::new(),
            cluster_name: "default".to_string(),
            secret: None,
            namespaces: vec!["application".to_string()],
            client_ip: None,
            poll: PollConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Convenience constructor for the three required connection settings.
    pub fn new(
        config_server_url: impl Into<String>,
        app_id: impl Into<String>,
        cluster_name: impl Into<String>,
    ) -> Self {
        Self {
            config_server_url: config_server_url.into(),
            app_id: app_id.into(),
            cluster_name: cluster_name.into(),
            ..Self::default()
        }
    }

    /// Attach an access secret.
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}

/// Long-poll loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollConfig {
    /// Fixed delay after a failed notification request, in seconds.
    pub failed_retry_secs: u64,

    /// HTTP timeout for the long-poll request, in seconds. Must exceed
    /// the server's hold time (60s on a stock server).
    pub long_poll_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            failed_retry_secs: 5,
            long_poll_timeout_secs: 90,
        }
    }
}

impl PollConfig {
    pub fn failed_retry_delay(&self) -> Duration {
        Duration::from_secs(self.failed_retry_secs)
    }
}

/// Timeout configuration for plain (non long-poll) requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Content fetch timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when RUST_LOG is unset.
    pub log_level: String,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9000".to_string(),
        }
    }
}
