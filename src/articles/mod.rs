//! Article retrieval subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (context attached by the tracing middleware)
//!     → transport.rs (decode → typed request)
//!     → endpoint.rs (use case, optional suggestion resolution)
//!     → service.rs (store lookups, suggestion chaining)
//!         → store.rs (immutable snapshot)
//!         → gateway.rs (suggestions service, context injected into headers)
//!     → transport.rs (encode response or error)
//! ```
//!
//! # Design Decisions
//! - Every stage opens its own span under the context it received
//! - Errors travel as `ArticleError` values up to the error encoder

pub mod endpoint;
pub mod errors;
pub mod gateway;
pub mod mock_data;
pub mod model;
pub mod service;
pub mod store;
pub mod transport;

pub use errors::{ArticleError, ArticleResult, UpstreamError};
pub use gateway::{HttpSuggestionGateway, StaticSuggestions, SuggestionGateway};
pub use model::{Article, ArticleId};
pub use service::{ArticleService, Articles};
pub use store::{ArticleStore, SnapshotError, SnapshotStore};
