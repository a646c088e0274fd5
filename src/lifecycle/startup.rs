//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the tracer and propagator from configuration
//! - Load the article snapshot
//! - Initialize client, gateway, service and server in dependency order
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::articles::gateway::HttpSuggestionGateway;
use crate::articles::service::Articles;
use crate::articles::store::{SnapshotError, SnapshotStore};
use crate::config::{ServiceConfig, TracingConfig};
use crate::http::HttpServer;
use crate::observability::otel::otlp_provider;
use crate::observability::{LogTracer, OtelTracer, Telemetry, W3cPropagator};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("cannot build suggestions client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("cannot build span exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
}

/// Tracer and propagator for the configured tracing mode.
///
/// With a backend URL spans are exported over OTLP, otherwise they are
/// reported through the log subscriber. Must run inside a tokio runtime.
pub fn build_telemetry(config: &TracingConfig) -> Result<Telemetry, StartupError> {
    if !config.enabled {
        return Ok(Telemetry::disabled());
    }

    let Some(backend) = &config.backend_url else {
        return Ok(Telemetry::new(
            Arc::new(LogTracer::new(config.service_name.clone())),
            Arc::new(W3cPropagator),
        ));
    };

    let provider = otlp_provider(backend, &config.service_name)?;
    tracing::info!(backend = %backend, service = %config.service_name, "Exporting spans over OTLP");
    Ok(Telemetry::new(
        Arc::new(OtelTracer::new(&provider, &config.service_name)),
        Arc::new(W3cPropagator),
    )
    .with_provider(provider))
}

/// Load the snapshot and assemble the server.
pub fn build_server(config: ServiceConfig, telemetry: Telemetry) -> Result<HttpServer, StartupError> {
    let store = SnapshotStore::load(&config.data_source.articles_path)?;

    let client = HttpSuggestionGateway::build_client(Duration::from_secs(config.suggestions.timeout_secs))?;
    let gateway = HttpSuggestionGateway::new(config.suggestions.host.clone(), client, telemetry.clone());

    let service = Articles::new(Arc::new(store), Arc::new(gateway), telemetry.tracer.clone());

    Ok(HttpServer::new(config, telemetry, Arc::new(service)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_snapshot_is_fatal() {
        let mut config = ServiceConfig::default();
        config.data_source.articles_path = "/definitely/not/here.json".into();

        let result = build_server(config, Telemetry::disabled());
        assert!(matches!(result, Err(StartupError::Snapshot(SnapshotError::Io(_)))));
    }

    #[test]
    fn test_build_server_from_snapshot() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"a":{{"id":"a"}}}}"#).unwrap();

        let mut config = ServiceConfig::default();
        config.data_source.articles_path = file.path().to_path_buf();

        let server = build_server(config, Telemetry::disabled()).unwrap();
        assert_eq!(server.config().suggestions.fanout_concurrency, 1);
    }

    #[test]
    fn test_disabled_tracing_uses_noop_ports() {
        let config = TracingConfig {
            enabled: false,
            ..TracingConfig::default()
        };
        let telemetry = build_telemetry(&config).unwrap();
        let (ctx, _span) = telemetry.tracer.start(&Default::default(), "x");
        assert!(ctx.trace_id().is_some());
    }

    #[tokio::test]
    async fn test_enabled_tracing_without_backend_logs_spans() {
        let config = TracingConfig {
            backend_url: None,
            ..TracingConfig::default()
        };
        let telemetry = build_telemetry(&config).unwrap();
        let (ctx, _span) = telemetry.tracer.start(&Default::default(), "x");
        assert!(ctx.trace_id().is_some());

        // Nothing to flush.
        telemetry.shutdown().await;
    }
}
