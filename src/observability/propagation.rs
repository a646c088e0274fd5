//! Propagator port: move trace context across process boundaries.
//!
//! # Responsibilities
//! - Extract trace context from inbound request headers
//! - Inject trace context into outbound request headers
//!
//! # Design Decisions
//! - W3C Trace Context (`traceparent`, `tracestate`), version `00` only
//! - Malformed inbound headers are ignored; the request starts a new trace

use axum::http::{HeaderMap, HeaderValue};

use crate::observability::context::{SpanContext, TraceContext};

/// W3C Trace Context header name for traceparent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// W3C Trace Context header name for tracestate
pub const TRACESTATE_HEADER: &str = "tracestate";

/// Capability to serialize trace context into string headers and back.
pub trait Propagator: Send + Sync {
    fn inject(&self, ctx: &TraceContext, carrier: &mut HeaderMap);

    /// Returns `parent` with the extracted remote span (if any) made active.
    fn extract(&self, parent: &TraceContext, carrier: &HeaderMap) -> TraceContext;
}

/// Propagator that never touches headers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPropagator;

impl Propagator for NoopPropagator {
    fn inject(&self, _ctx: &TraceContext, _carrier: &mut HeaderMap) {}

    fn extract(&self, parent: &TraceContext, _carrier: &HeaderMap) -> TraceContext {
        parent.clone()
    }
}

/// W3C Trace Context propagator.
#[derive(Debug, Default, Clone, Copy)]
pub struct W3cPropagator;

impl Propagator for W3cPropagator {
    fn inject(&self, ctx: &TraceContext, carrier: &mut HeaderMap) {
        let Some(span) = ctx.span_context() else {
            return;
        };

        if let Ok(value) = HeaderValue::from_str(&to_traceparent(span)) {
            carrier.insert(TRACEPARENT_HEADER, value);
        }

        if let Some(state) = ctx.trace_state() {
            if let Ok(value) = HeaderValue::from_str(state) {
                carrier.insert(TRACESTATE_HEADER, value);
            }
        }
    }

    fn extract(&self, parent: &TraceContext, carrier: &HeaderMap) -> TraceContext {
        let span = carrier
            .get(TRACEPARENT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(from_traceparent);

        let Some(span) = span else {
            return parent.clone();
        };

        let state = carrier
            .get(TRACESTATE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        parent.with_span(span).with_trace_state(state)
    }
}

/// Format as W3C traceparent header value
pub fn to_traceparent(span: &SpanContext) -> String {
    format!("00-{}-{}-{:02x}", span.trace_id, span.span_id, span.trace_flags)
}

/// Parse from W3C traceparent header value
pub fn from_traceparent(value: &str) -> Option<SpanContext> {
    let parts: Vec<&str> = value.trim().split('-').collect();
    if parts.len() != 4 {
        return None;
    }

    // Only version 00 is supported
    if parts[0] != "00" {
        return None;
    }

    let (trace_id, span_id, flags) = (parts[1], parts[2], parts[3]);
    if trace_id.len() != 32 || span_id.len() != 16 || flags.len() != 2 {
        return None;
    }
    if !is_lower_hex(trace_id) || !is_lower_hex(span_id) {
        return None;
    }
    if trace_id.bytes().all(|b| b == b'0') || span_id.bytes().all(|b| b == b'0') {
        return None;
    }

    let trace_flags = u8::from_str_radix(flags, 16).ok()?;

    Some(SpanContext {
        trace_id: trace_id.to_string(),
        span_id: span_id.to_string(),
        trace_flags,
        remote: true,
    })
}

fn is_lower_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
