//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize, or defaults)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → budgets and addresses handed to each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use schema::{
    ClientConfig, ListenerConfig, ObservabilityConfig, RelayConfig, StorageConfig, TimeoutConfig,
    UpstreamConfig,
};
pub use validation::ValidationError;
