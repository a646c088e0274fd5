//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, access logs)
//!     → middleware/trace_context.rs (extract context, root span, deadline)
//!     → articles::transport (decode → endpoint → encode)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use server::HttpServer;
