//! Outbound client for the suggestions service.
//!
//! # Responsibilities
//! - Build `<host>/suggestions/v1/<id>` for an article
//! - Forward the active trace context in the request headers
//! - Decode the JSON array of suggested identifiers
//!
//! # Design Decisions
//! - The URL is built before any network activity, so a bad host fails fast
//! - Non-2xx responses are decoded like any other; a body that is not an
//!   identifier array surfaces as `UpstreamError::Decode` carrying the status
//! - No retries; the timeout lives on the shared `reqwest::Client`
//! - A cancelled or expired context aborts the in-flight call

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use url::Url;

use crate::articles::errors::{ArticleResult, UpstreamError};
use crate::articles::model::ArticleId;
use crate::observability::metrics;
use crate::observability::{Telemetry, TraceContext};

/// Source of related-article identifiers.
#[async_trait]
pub trait SuggestionGateway: Send + Sync {
    async fn fetch_suggested_ids(
        &self,
        ctx: &TraceContext,
        id: &ArticleId,
    ) -> ArticleResult<Vec<ArticleId>>;
}

/// Build the suggestions URL for `id` under `host`.
pub fn suggestions_url(host: &str, id: &ArticleId) -> Result<Url, UpstreamError> {
    let invalid = |reason: String| UpstreamError::InvalidUrl {
        host: host.to_string(),
        reason,
    };

    let mut url = Url::parse(host).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid("url cannot be a base".to_string()))?
        .pop_if_empty()
        .extend(["suggestions", "v1", id.as_str()]);
    Ok(url)
}

/// Suggestions gateway over HTTP.
#[derive(Clone)]
pub struct HttpSuggestionGateway {
    host: String,
    client: reqwest::Client,
    telemetry: Telemetry,
}

impl HttpSuggestionGateway {
    /// `client` is shared across all requests; it must carry the call timeout.
    pub fn new(host: impl Into<String>, client: reqwest::Client, telemetry: Telemetry) -> Self {
        Self {
            host: host.into(),
            client,
            telemetry,
        }
    }

    /// HTTP client with the given per-call timeout.
    pub fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(timeout).build()
    }

    async fn call(&self, url: Url, headers: HeaderMap) -> Result<(u16, Vec<u8>), UpstreamError> {
        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok((status, body.to_vec()))
    }
}

#[async_trait]
impl SuggestionGateway for HttpSuggestionGateway {
    async fn fetch_suggested_ids(
        &self,
        ctx: &TraceContext,
        id: &ArticleId,
    ) -> ArticleResult<Vec<ArticleId>> {
        ctx.check()?;

        let url = suggestions_url(&self.host, id).inspect_err(|e| {
            metrics::record_upstream_failure(e.kind());
        })?;

        let (span_ctx, mut span) = self.telemetry.tracer.start(ctx, "HTTP GET");
        span.set_attribute("http.method", "GET");
        span.set_attribute("http.url", url.as_str());

        let mut headers = HeaderMap::new();
        self.telemetry.propagator.inject(&span_ctx, &mut headers);

        let (status, body) = tokio::select! {
            biased;
            err = ctx.done() => return Err(err.into()),
            result = self.call(url, headers) => result.inspect_err(|e| {
                tracing::warn!(article_id = %id, error = %e, "Suggestions request failed");
                metrics::record_upstream_failure(e.kind());
            })?,
        };
        span.set_attribute("http.status_code", status.to_string());

        decode_ids(status, &body).inspect_err(|_| metrics::record_upstream_failure("decode"))
    }
}

/// Decode a suggestions response body, whatever its status.
pub fn decode_ids(status: u16, body: &[u8]) -> ArticleResult<Vec<ArticleId>> {
    serde_json::from_slice(body).map_err(|source| UpstreamError::Decode { status, source }.into())
}

/// In-memory gateway with fixed answers, for wiring tests and local runs.
///
/// Unknown ids fail the same way the real service does for a missing entry:
/// a decode error on the 404 error body.
#[derive(Debug, Default)]
pub struct StaticSuggestions {
    suggestions: HashMap<ArticleId, Vec<ArticleId>>,
    calls: Mutex<Vec<ArticleId>>,
}

impl StaticSuggestions {
    pub fn new(suggestions: HashMap<ArticleId, Vec<ArticleId>>) -> Self {
        Self {
            suggestions,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, Vec<&'a str>)>) -> Self {
        Self::new(
            pairs
                .into_iter()
                .map(|(id, ids)| (id.into(), ids.into_iter().map(ArticleId::from).collect()))
                .collect(),
        )
    }

    /// Ids requested so far, in call order.
    pub fn calls(&self) -> Vec<ArticleId> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SuggestionGateway for StaticSuggestions {
    async fn fetch_suggested_ids(
        &self,
        ctx: &TraceContext,
        id: &ArticleId,
    ) -> ArticleResult<Vec<ArticleId>> {
        ctx.check()?;
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(id.clone());
        }

        match self.suggestions.get(id) {
            Some(ids) if !ids.is_empty() => Ok(ids.clone()),
            _ => {
                let body = format!(r#"{{"errors":["there are no suggestions for `{}` article"]}}"#, id);
                decode_ids(404, body.as_bytes())
            }
        }
    }
}
