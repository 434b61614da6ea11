//! Durable quote storage.
//!
//! # Data Flow
//! ```text
//! startup:   QuoteStore::open → PRAGMAs → CREATE TABLE IF NOT EXISTS
//! request:   persist(quote, deadline) → spawn_blocking INSERT
//!                → Ok | PersistError::Timeout | PersistError::Storage
//! ```
//!
//! # Design Decisions
//! - Append-only: rows are never updated or deleted
//! - One connection shared by all requests; SQLite provides atomicity
//! - The persist deadline is local to the write, not the caller's

pub mod database;
pub mod error;
pub mod schema;

pub use database::{QuoteRecord, QuoteStore};
pub use error::{PersistError, StoreError};
