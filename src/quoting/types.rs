//! Quote data types.

use serde::Serialize;
use thiserror::Error;

/// A currency buy price.
///
/// The bid is kept as the exact text the source sent; it is never converted
/// to floating point. A `Quote` always has a non-empty bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    bid: String,
}

/// Reasons a bid cannot form a [`Quote`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidQuote {
    #[error("bid is empty")]
    EmptyBid,
}

impl Quote {
    pub fn new(bid: impl Into<String>) -> Result<Self, InvalidQuote> {
        let bid = bid.into();
        if bid.is_empty() {
            return Err(InvalidQuote::EmptyBid);
        }
        Ok(Self { bid })
    }

    pub fn bid(&self) -> &str {
        &self.bid
    }
}
