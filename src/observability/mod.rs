//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers
//!     → propagation.rs (extract remote span)
//!     → tracer.rs (root span "<METHOD> <PATH>", child spans per stage)
//!     → context.rs (TraceContext handed call by call)
//!     → propagation.rs (inject into suggestions request headers)
//!
//! Ambient:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//! ```
//!
//! # Design Decisions
//! - Tracer and propagator are injected at construction, never global
//! - With a collector configured, spans are exported over OTLP (otel.rs);
//!   otherwise they are reported through the log subscriber
//! - Metrics are cheap (atomic increments)

pub mod context;
pub mod logging;
pub mod metrics;
pub mod otel;
pub mod propagation;
pub mod tracer;

use std::sync::Arc;

use opentelemetry_sdk::trace::SdkTracerProvider;

pub use context::{ContextError, SpanContext, TraceContext};
pub use otel::OtelTracer;
pub use propagation::{NoopPropagator, Propagator, W3cPropagator};
pub use tracer::{InMemoryTracer, LogTracer, NoopTracer, SpanGuard, Tracer};

/// Tracer and propagator capabilities handed to every component.
#[derive(Clone)]
pub struct Telemetry {
    pub tracer: Arc<dyn Tracer>,
    pub propagator: Arc<dyn Propagator>,
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    pub fn new(tracer: Arc<dyn Tracer>, propagator: Arc<dyn Propagator>) -> Self {
        Self {
            tracer,
            propagator,
            provider: None,
        }
    }

    /// Keep `provider` so pending spans can be flushed at shutdown.
    pub fn with_provider(mut self, provider: SdkTracerProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Flush and stop span export. No-op without an exporting provider.
    pub async fn shutdown(&self) {
        let Some(provider) = self.provider.clone() else {
            return;
        };

        match tokio::task::spawn_blocking(move || provider.shutdown()).await {
            Ok(Ok(())) => tracing::info!("Span exporter flushed"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Span exporter shutdown failed"),
            Err(e) => tracing::warn!(error = %e, "Span exporter shutdown task failed"),
        }
    }

    /// Spans go nowhere and no headers are propagated.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopTracer), Arc::new(NoopPropagator))
    }
}
