//! Error taxonomy for the article pipeline.

use thiserror::Error;

use crate::articles::model::ArticleId;
use crate::observability::ContextError;

/// Errors that can terminate a request at any stage.
#[derive(Debug, Error)]
pub enum ArticleError {
    /// The requested article is not in the store.
    #[error("article `{0}` was not found")]
    NotFound(ArticleId),

    /// The inbound request lacked a required parameter.
    #[error("{0}")]
    RequestShape(String),

    /// Calling or decoding the suggestions service failed.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

impl From<ContextError> for ArticleError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::Cancelled => ArticleError::Cancelled,
            ContextError::DeadlineExceeded => ArticleError::DeadlineExceeded,
        }
    }
}

/// Failures talking to the suggestions service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The configured host does not form a valid request URL.
    #[error("invalid suggestions url from host `{host}`: {reason}")]
    InvalidUrl { host: String, reason: String },

    /// Network or protocol error from the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// The body was not a JSON array of identifiers.
    #[error("cannot decode suggestions response (status {status}): {source}")]
    Decode {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

impl UpstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::InvalidUrl { .. } => "invalid_url",
            UpstreamError::Transport(_) => "transport",
            UpstreamError::Decode { .. } => "decode",
        }
    }
}

pub type ArticleResult<T> = Result<T, ArticleError>;
