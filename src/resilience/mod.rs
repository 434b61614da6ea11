//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Stage call (fetch / persist):
//!     → timeouts.rs (run under the stage's own Deadline)
//!     → On expiry: typed timeout error, mapped to 504 by the http layer
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries: a failed stage is final for its request

pub mod timeouts;

pub use timeouts::{Deadline, DeadlineExceeded};
