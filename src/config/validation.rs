//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (budgets > 0, addresses parse)
//! - Validate the upstream URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("upstream.url: {0}")]
    InvalidUrl(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match Url::parse(&config.upstream.url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        ))),
        Err(e) => errors.push(ValidationError::InvalidUrl(e.to_string())),
    }

    if config.upstream.pair.trim().is_empty() {
        errors.push(ValidationError::Empty("upstream.pair"));
    }
    if config.storage.path.trim().is_empty() {
        errors.push(ValidationError::Empty("storage.path"));
    }

    let budgets = [
        ("upstream.timeout_ms", config.upstream.timeout_ms),
        ("storage.timeout_ms", config.storage.timeout_ms),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("client.timeout_ms", config.client.timeout_ms),
    ];
    for (field, value) in budgets {
        if value == 0 {
            errors.push(ValidationError::ZeroDuration(field));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
