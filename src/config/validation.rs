//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, concurrency > 0)
//! - Validate addresses and URLs before any subsystem starts
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("suggestions.host `{0}` is not a valid http(s) base url")]
    SuggestionsHost(String),

    #[error("suggestions.timeout_secs must be greater than zero")]
    SuggestionsTimeout,

    #[error("suggestions.fanout_concurrency must be greater than zero")]
    FanoutConcurrency,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let host_ok = Url::parse(&config.suggestions.host)
        .map(|u| matches!(u.scheme(), "http" | "https") && !u.cannot_be_a_base())
        .unwrap_or(false);
    if !host_ok {
        errors.push(ValidationError::SuggestionsHost(config.suggestions.host.clone()));
    }

    if config.suggestions.timeout_secs == 0 {
        errors.push(ValidationError::SuggestionsTimeout);
    }

    if config.suggestions.fanout_concurrency == 0 {
        errors.push(ValidationError::FanoutConcurrency);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
