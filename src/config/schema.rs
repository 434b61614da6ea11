//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files, and
//! the defaults reproduce the reference deployment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the quote relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream quote source.
    pub upstream: UpstreamConfig,

    /// Durable quote storage.
    pub storage: StorageConfig,

    /// Server-wide timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Settings used by the `quote-client` binary.
    pub client: ClientConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream quote source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Endpoint returning the quote document.
    pub url: String,

    /// Key of the currency-pair sub-document (e.g., "USDBRL").
    pub pair: String,

    /// Fetch sub-deadline in milliseconds.
    pub timeout_ms: u64,

    /// Honor HTTP(S)_PROXY from the environment.
    pub use_system_proxy: bool,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://economia.awesomeapi.com.br/json/last/USD-BRL".to_string(),
            pair: "USDBRL".to_string(),
            timeout_ms: 200,
            use_system_proxy: true,
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub path: String,

    /// Persist sub-deadline in milliseconds.
    pub timeout_ms: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "./cotacao.db".to_string(),
            timeout_ms: 10,
        }
    }
}

/// Timeout configuration for the server as a whole.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upper bound for a whole inbound request, in seconds.
    pub request_secs: u64,

    /// How long in-flight requests may drain after a shutdown signal.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            shutdown_secs: 3,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the relay's quote endpoint.
    pub server_url: String,

    /// Client-side deadline in milliseconds.
    pub timeout_ms: u64,

    /// File overwritten with the latest quote.
    pub output_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/cotacao".to_string(),
            timeout_ms: 300,
            output_path: "./cotacao.txt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_budgets() {
        let config = RelayConfig::default();
        assert_eq!(config.upstream.timeout(), Duration::from_millis(200));
        assert_eq!(config.storage.timeout(), Duration::from_millis(10));
        assert_eq!(config.client.timeout_ms, 300);
        assert_eq!(config.upstream.pair, "USDBRL");
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [upstream]
            timeout_ms = 500

            [storage]
            path = "/tmp/quotes.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.timeout_ms, 500);
        assert_eq!(config.upstream.pair, "USDBRL");
        assert_eq!(config.storage.path, "/tmp/quotes.db");
        assert_eq!(config.storage.timeout_ms, 10);
        assert_eq!(config.timeouts.shutdown_secs, 3);
    }
}
