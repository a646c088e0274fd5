//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the article routes
//! - Wire up middleware (inbound tracing, access logs)
//! - Bind server to listener
//! - Stop accepting and drain on shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::articles::service::ArticleService;
use crate::articles::transport::{make_router, TransportState};
use crate::config::ServiceConfig;
use crate::http::middleware::{trace_requests, TracingLayerState};
use crate::observability::Telemetry;

/// HTTP server for the articles service.
pub struct HttpServer {
    router: Router,
    config: ServiceConfig,
}

impl HttpServer {
    /// Create a new HTTP server around an already-built service.
    pub fn new(config: ServiceConfig, telemetry: Telemetry, service: Arc<dyn ArticleService>) -> Self {
        let transport = TransportState::new(
            service,
            telemetry.tracer.clone(),
            config.suggestions.fanout_concurrency,
        );
        let tracing_state = TracingLayerState::new(
            telemetry,
            Some(Duration::from_secs(config.timeouts.request_secs)),
        );

        let router = Self::build_router(transport, tracing_state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(transport: TransportState, tracing_state: TracingLayerState) -> Router {
        make_router(transport)
            .layer(middleware::from_fn_with_state(Arc::new(tracing_state), trace_requests))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            suggestions_host = %self.config.suggestions.host,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for in-process tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }
}
