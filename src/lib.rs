//! Currency quote relay library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod quoting;
pub mod resilience;
pub mod storage;

pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use storage::QuoteStore;
