//! Trace context threaded through every call.
//!
//! # Responsibilities
//! - Carry the active span identity (trace id, span id, flags)
//! - Carry request cancellation and deadline state
//! - Generate W3C-compatible identifiers for new traces and spans
//!
//! # Design Decisions
//! - Cloning a context shares its cancellation token; deriving a child span
//!   never creates an independent cancellation scope
//! - Identifiers are lowercase hex strings, as they appear on the wire

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reason a context stopped being usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Identity of a single span within a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    /// Trace ID (128-bit, 32 hex chars).
    pub trace_id: String,
    /// Span ID (64-bit, 16 hex chars).
    pub span_id: String,
    /// W3C trace flags.
    pub trace_flags: u8,
    /// True when the span was extracted from an inbound carrier.
    pub remote: bool,
}

impl SpanContext {
    pub const FLAG_SAMPLED: u8 = 0x01;

    /// A new local span, optionally continuing an existing trace.
    pub fn new_child(parent: Option<&SpanContext>) -> Self {
        match parent {
            Some(parent) => Self {
                trace_id: parent.trace_id.clone(),
                span_id: generate_span_id(),
                trace_flags: parent.trace_flags,
                remote: false,
            },
            None => Self {
                trace_id: generate_trace_id(),
                span_id: generate_span_id(),
                trace_flags: Self::FLAG_SAMPLED,
                remote: false,
            },
        }
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags & Self::FLAG_SAMPLED == Self::FLAG_SAMPLED
    }
}

/// Opaque per-request context: span ancestry plus cancellation state.
#[derive(Clone, Debug, Default)]
pub struct TraceContext {
    span: Option<SpanContext>,
    trace_state: Option<String>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl TraceContext {
    /// An empty context with no span, no deadline and a fresh cancellation token.
    pub fn background() -> Self {
        Self::default()
    }

    /// Same cancellation scope, different active span.
    pub fn with_span(&self, span: SpanContext) -> Self {
        Self {
            span: Some(span),
            ..self.clone()
        }
    }

    pub fn with_trace_state(mut self, state: Option<String>) -> Self {
        self.trace_state = state;
        self
    }

    /// Set a deadline relative to now. An earlier existing deadline is kept.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn span_context(&self) -> Option<&SpanContext> {
        self.span.as_ref()
    }

    pub fn trace_id(&self) -> Option<&str> {
        self.span.as_ref().map(|s| s.trace_id.as_str())
    }

    pub fn span_id(&self) -> Option<&str> {
        self.span.as_ref().map(|s| s.span_id.as_str())
    }

    pub fn trace_state(&self) -> Option<&str> {
        self.trace_state.as_deref()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this context and every clone of it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fails if the context was cancelled or its deadline passed.
    pub fn check(&self) -> Result<(), ContextError> {
        if self.cancel.is_cancelled() {
            return Err(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ContextError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or expires.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => ContextError::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

impl fmt::Display for TraceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(f, "{}/{}", span.trace_id, span.span_id),
            None => f.write_str("-"),
        }
    }
}

/// Generate a new trace ID (128-bit, 32 hex chars, never all zeros).
pub fn generate_trace_id() -> String {
    format!("{:032x}", rand::random::<u128>().max(1))
}

/// Generate a new span ID (64-bit, 16 hex chars, never all zeros).
pub fn generate_span_id() -> String {
    format!("{:016x}", rand::random::<u64>().max(1))
}
