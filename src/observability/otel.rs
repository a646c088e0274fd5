//! OpenTelemetry span export.
//!
//! # Responsibilities
//! - Build an OTLP/gRPC tracer provider for the configured collector
//! - Adapt the SDK tracer to the `Tracer` port
//!
//! # Design Decisions
//! - Every span is sampled; export is batched off the request path
//! - The provider is carried by `Telemetry` and flushed at shutdown, it is
//!   never registered as a global

use std::time::Duration;

use opentelemetry::trace::{
    Span as _, SpanContext as OtelSpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
    Tracer as _, TracerProvider as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;

use crate::observability::context::{SpanContext, TraceContext};
use crate::observability::tracer::{SpanGuard, SpanHandle, Tracer};

const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider exporting to the OTLP/gRPC collector at `endpoint`.
///
/// Must be called inside a tokio runtime.
pub fn otlp_provider(endpoint: &str, service_name: &str) -> Result<SdkTracerProvider, ExporterBuildError> {
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(collector_url(endpoint))
        .with_timeout(EXPORT_TIMEOUT)
        .build()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .with_attributes([KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
        .build();

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Collector addresses are usually configured as a bare `host:port`.
pub fn collector_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{}", endpoint)
    }
}

/// `Tracer` backed by an SDK tracer; spans are exported by its provider.
#[derive(Debug)]
pub struct OtelTracer {
    tracer: opentelemetry_sdk::trace::Tracer,
}

impl OtelTracer {
    pub fn new(provider: &SdkTracerProvider, service_name: &str) -> Self {
        Self {
            tracer: provider.tracer(service_name.to_string()),
        }
    }
}

impl Tracer for OtelTracer {
    fn start(&self, parent: &TraceContext, name: &str) -> (TraceContext, SpanGuard) {
        let parent_cx = parent_context(parent.span_context());
        let span = self.tracer.start_with_context(name.to_string(), &parent_cx);

        let otel = span.span_context();
        let child = SpanContext {
            trace_id: otel.trace_id().to_string(),
            span_id: otel.span_id().to_string(),
            trace_flags: otel.trace_flags().to_u8(),
            remote: false,
        };
        (parent.with_span(child), SpanGuard::new(Box::new(OtelSpan(span))))
    }
}

fn parent_context(span: Option<&SpanContext>) -> Context {
    let Some(span) = span else {
        return Context::new();
    };
    let (Ok(trace_id), Ok(span_id)) = (TraceId::from_hex(&span.trace_id), SpanId::from_hex(&span.span_id)) else {
        return Context::new();
    };

    Context::new().with_remote_span_context(OtelSpanContext::new(
        trace_id,
        span_id,
        TraceFlags::new(span.trace_flags),
        span.remote,
        TraceState::default(),
    ))
}

struct OtelSpan(opentelemetry_sdk::trace::Span);

impl SpanHandle for OtelSpan {
    fn set_attribute(&mut self, key: &str, value: String) {
        self.0.set_attribute(KeyValue::new(key.to_string(), value));
    }

    fn end(&mut self) {
        self.0.end();
    }
}
