//! Tracer port: start named spans bound to a context.
//!
//! # Responsibilities
//! - Derive a child context for every started span
//! - Attach key/value attributes to a span
//! - Guarantee that every started span is ended, including on error paths
//!
//! # Design Decisions
//! - `SpanGuard` ends its span on drop; `end()` is explicit and idempotent
//! - Export is the subscriber's concern: `LogTracer` only emits `tracing` events
//! - `InMemoryTracer` records span lifecycles for assertions in tests

use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::observability::context::{SpanContext, TraceContext};

/// Capability to start spans.
pub trait Tracer: Send + Sync {
    /// Start a span named `name` as a child of the span active in `parent`.
    ///
    /// Returns the derived context (with the new span active) and the span guard.
    fn start(&self, parent: &TraceContext, name: &str) -> (TraceContext, SpanGuard);
}

/// Backend-specific span operations.
pub trait SpanHandle: Send {
    fn set_attribute(&mut self, key: &str, value: String);

    fn end(&mut self);
}

/// Owned handle to a started span.
pub struct SpanGuard {
    handle: Box<dyn SpanHandle>,
    ended: bool,
}

impl SpanGuard {
    pub fn new(handle: Box<dyn SpanHandle>) -> Self {
        Self {
            handle,
            ended: false,
        }
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        if !self.ended {
            self.handle.set_attribute(key, value.into());
        }
    }

    pub fn end(&mut self) {
        if !self.ended {
            self.ended = true;
            self.handle.end();
        }
    }
}

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.end();
    }
}

/// Tracer that creates spans but records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;

struct NoopSpan;

impl SpanHandle for NoopSpan {
    fn set_attribute(&mut self, _key: &str, _value: String) {}

    fn end(&mut self) {}
}

impl Tracer for NoopTracer {
    fn start(&self, parent: &TraceContext, _name: &str) -> (TraceContext, SpanGuard) {
        let span = SpanContext::new_child(parent.span_context());
        (parent.with_span(span), SpanGuard::new(Box::new(NoopSpan)))
    }
}

/// Tracer that reports spans through the `tracing` crate.
#[derive(Debug, Clone)]
pub struct LogTracer {
    service_name: String,
}

impl LogTracer {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }
}

struct LogSpan {
    span: tracing::Span,
    started: Instant,
    attributes: Vec<(String, String)>,
}

impl SpanHandle for LogSpan {
    fn set_attribute(&mut self, key: &str, value: String) {
        self.attributes.push((key.to_string(), value));
    }

    fn end(&mut self) {
        let attributes = std::mem::take(&mut self.attributes);
        tracing::info!(
            parent: &self.span,
            elapsed_us = self.started.elapsed().as_micros() as u64,
            attributes = ?attributes,
            "span ended"
        );
    }
}

impl Tracer for LogTracer {
    fn start(&self, parent: &TraceContext, name: &str) -> (TraceContext, SpanGuard) {
        let parent_span = parent.span_context();
        let span = SpanContext::new_child(parent_span);
        let tracing_span = tracing::info_span!(
            "span",
            otel.name = %name,
            service = %self.service_name,
            trace_id = %span.trace_id,
            span_id = %span.span_id,
            parent_span_id = parent_span.map(|p| p.span_id.as_str()).unwrap_or(""),
        );
        let ctx = parent.with_span(span);
        let handle = LogSpan {
            span: tracing_span,
            started: Instant::now(),
            attributes: Vec::new(),
        };
        (ctx, SpanGuard::new(Box::new(handle)))
    }
}

/// One span as seen by `InMemoryTracer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanRecord {
    pub name: String,
    pub trace_id: String,
    pub span_id: String,
    pub parent_span_id: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub ended: bool,
}

/// Span lifecycle event, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanEvent {
    Started(String),
    Ended(String),
}

#[derive(Default)]
struct Recorded {
    spans: Vec<SpanRecord>,
    events: Vec<SpanEvent>,
}

/// Tracer that keeps every span in memory.
#[derive(Clone, Default)]
pub struct InMemoryTracer {
    recorded: Arc<Mutex<Recorded>>,
}

impl InMemoryTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spans(&self) -> Vec<SpanRecord> {
        self.lock().spans.clone()
    }

    pub fn events(&self) -> Vec<SpanEvent> {
        self.lock().events.clone()
    }

    /// The first span recorded under `name`.
    pub fn span(&self, name: &str) -> Option<SpanRecord> {
        self.lock().spans.iter().find(|s| s.name == name).cloned()
    }

    pub fn span_names(&self) -> Vec<String> {
        self.lock().spans.iter().map(|s| s.name.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        // A poisoned lock only means a test thread panicked mid-record.
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

struct InMemorySpan {
    recorded: Arc<Mutex<Recorded>>,
    index: usize,
}

impl InMemorySpan {
    fn with_record(&self, f: impl FnOnce(&mut Recorded)) {
        let mut recorded = self.recorded.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut recorded);
    }
}

impl SpanHandle for InMemorySpan {
    fn set_attribute(&mut self, key: &str, value: String) {
        let index = self.index;
        self.with_record(|r| r.spans[index].attributes.push((key.to_string(), value)));
    }

    fn end(&mut self) {
        let index = self.index;
        self.with_record(|r| {
            r.spans[index].ended = true;
            let name = r.spans[index].name.clone();
            r.events.push(SpanEvent::Ended(name));
        });
    }
}

impl Tracer for InMemoryTracer {
    fn start(&self, parent: &TraceContext, name: &str) -> (TraceContext, SpanGuard) {
        let parent_span = parent.span_context();
        let span = SpanContext::new_child(parent_span);

        let index = {
            let mut recorded = self.lock();
            recorded.spans.push(SpanRecord {
                name: name.to_string(),
                trace_id: span.trace_id.clone(),
                span_id: span.span_id.clone(),
                parent_span_id: parent_span.map(|p| p.span_id.clone()),
                attributes: Vec::new(),
                ended: false,
            });
            recorded.events.push(SpanEvent::Started(name.to_string()));
            recorded.spans.len() - 1
        };

        let handle = InMemorySpan {
            recorded: self.recorded.clone(),
            index,
        };
        (parent.with_span(span), SpanGuard::new(Box::new(handle)))
    }
}
