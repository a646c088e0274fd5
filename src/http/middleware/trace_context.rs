//! Inbound tracing middleware.
//! Continues or starts a trace for every request and brackets it with a root span.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::{metrics, Telemetry, TraceContext};

/// State for `trace_requests`.
#[derive(Clone)]
pub struct TracingLayerState {
    pub telemetry: Telemetry,
    /// Deadline attached to every request context.
    pub request_timeout: Option<Duration>,
}

impl TracingLayerState {
    pub fn new(telemetry: Telemetry, request_timeout: Option<Duration>) -> Self {
        Self {
            telemetry,
            request_timeout,
        }
    }
}

pub async fn trace_requests(
    State(state): State<Arc<TracingLayerState>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let span_name = format!("{} {}", method, req.uri().path());

    let mut base = TraceContext::background();
    if let Some(timeout) = state.request_timeout {
        base = base.with_timeout(timeout);
    }

    // 1. Continue the caller's trace if it sent one
    let parent = state.telemetry.propagator.extract(&base, req.headers());

    // 2. Root span for the whole request
    let (ctx, mut span) = state.telemetry.tracer.start(&parent, &span_name);
    span.set_attribute("http.method", method.as_str());
    span.set_attribute("http.target", req.uri().to_string());

    // Work still running for this request is cancelled if the client goes away.
    let _cancel_on_drop = ctx.cancellation_token().clone().drop_guard();

    tracing::debug!(
        trace_id = ctx.trace_id().unwrap_or_default(),
        span = %span_name,
        "Request started"
    );

    // 3. Hand the derived context to the handlers
    req.extensions_mut().insert(ctx);
    let response = next.run(req).await;

    let status = response.status().as_u16();
    span.set_attribute("http.status_code", status.to_string());
    span.end();

    metrics::record_request(&method, status, start);
    response
}
