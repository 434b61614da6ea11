//! Client SDK for the quote relay's `GET /cotacao` endpoint.

pub mod client;

pub use client::{format_quote_line, write_quote_file, ClientError, QuoteClient, QuoteResponse};
