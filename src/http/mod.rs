//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID set, traced, propagated)
//!     → quote.rs (GET /cotacao → orchestrator)
//!     → response.rs (outcome → status + body)
//!     → Send to client
//! ```

pub mod quote;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
