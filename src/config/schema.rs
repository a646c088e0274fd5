//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the articles service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Outbound suggestions service settings.
    pub suggestions: SuggestionsConfig,

    /// Article snapshot location.
    pub data_source: DataSourceConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Span creation and export settings.
    pub tracing: TracingConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
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

/// Suggestions service client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    /// Base URL, e.g. "http://suggestions:8081".
    pub host: String,

    /// Timeout applied by the shared HTTP client to every call.
    pub timeout_secs: u64,

    /// Articles resolved at once when listing with suggestions (1 = sequential).
    pub fanout_concurrency: usize,
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8081".to_string(),
            timeout_secs: 10,
            fanout_concurrency: 1,
        }
    }
}

/// Article snapshot configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataSourceConfig {
    /// JSON file mapping article ids to articles.
    pub articles_path: PathBuf,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            articles_path: PathBuf::from("mocks/articles.json"),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline attached to every request context, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Create spans and propagate trace context.
    pub enabled: bool,

    /// Service name reported on every span.
    pub service_name: String,

    /// Tracing backend endpoint, handed to the span exporter.
    pub backend_url: Option<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_name: "articles-service".to_string(),
            backend_url: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
