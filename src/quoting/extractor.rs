//! Quote extraction from the upstream document.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::quoting::types::{InvalidQuote, Quote};

/// The upstream document violated its contract.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("payload has no '{0}' member")]
    MissingPair(String),

    #[error("'{pair}' could not be decoded: {source}")]
    Decode {
        pair: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("'{pair}' has an invalid bid: {source}")]
    Invalid {
        pair: String,
        #[source]
        source: InvalidQuote,
    },
}

// Shape of the pair sub-document; other members are ignored.
#[derive(Deserialize)]
struct QuoteFields {
    bid: String,
}

/// Pulls the named currency-pair member out of a document and decodes it.
#[derive(Debug, Clone)]
pub struct QuoteExtractor {
    pair: String,
}

impl QuoteExtractor {
    pub fn new(pair: impl Into<String>) -> Self {
        Self { pair: pair.into() }
    }

    pub fn extract(&self, payload: &[u8]) -> Result<Quote, ExtractError> {
        let mut document: Value = serde_json::from_slice(payload).map_err(ExtractError::Malformed)?;

        let sub = document
            .get_mut(&self.pair)
            .map(Value::take)
            .ok_or_else(|| ExtractError::MissingPair(self.pair.clone()))?;

        let fields = QuoteFields::deserialize(sub).map_err(|source| ExtractError::Decode {
            pair: self.pair.clone(),
            source,
        })?;

        Quote::new(fields.bid).map_err(|source| ExtractError::Invalid {
            pair: self.pair.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_PAYLOAD: &str = r#"{
        "USDBRL": {
            "code": "USD",
            "codein": "BRL",
            "name": "Dólar Americano/Real Brasileiro",
            "high": "5.1523",
            "low": "5.0891",
            "varBid": "0.0123",
            "pctChange": "0.24",
            "bid": "5.1234",
            "ask": "5.1244",
            "timestamp": "1718049599",
            "create_date": "2024-06-10 16:59:59"
        }
    }"#;

    fn extractor() -> QuoteExtractor {
        QuoteExtractor::new("USDBRL")
    }

    #[test]
    fn test_extracts_bid() {
        let quote = extractor().extract(br#"{"USDBRL":{"bid":"5.12"}}"#).unwrap();
        assert_eq!(quote.bid(), "5.12");
    }

    #[test]
    fn test_ignores_other_members() {
        let quote = extractor().extract(FULL_PAYLOAD.as_bytes()).unwrap();
        assert_eq!(quote.bid(), "5.1234");
    }

    #[test]
    fn test_malformed_document() {
        let err = extractor().extract(b"<html>502</html>").unwrap_err();
        assert!(matches!(err, ExtractError::Malformed(_)));
    }

    #[test]
    fn test_missing_pair() {
        let err = extractor().extract(br#"{"EURBRL":{"bid":"6.01"}}"#).unwrap_err();
        assert!(matches!(err, ExtractError::MissingPair(ref p) if p == "USDBRL"));

        // A non-object document has no members at all.
        let err = extractor().extract(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ExtractError::MissingPair(_)));
    }

    #[test]
    fn test_undecodable_sub_document() {
        for payload in [
            r#"{"USDBRL":{"ask":"5.13"}}"#,
            r#"{"USDBRL":{"bid":5.12}}"#,
            r#"{"USDBRL":"5.12"}"#,
            r#"{"USDBRL":null}"#,
        ] {
            let err = extractor().extract(payload.as_bytes()).unwrap_err();
            assert!(matches!(err, ExtractError::Decode { .. }), "{payload}: {err:?}");
        }
    }

    #[test]
    fn test_invalid_bid() {
        let err = extractor().extract(br#"{"USDBRL":{"bid":""}}"#).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Invalid {
                source: InvalidQuote::EmptyBid,
                ..
            }
        ));
    }

    #[test]
    fn test_configured_pair() {
        let quote = QuoteExtractor::new("EURBRL")
            .extract(br#"{"EURBRL":{"bid":"6.01"}}"#)
            .unwrap();
        assert_eq!(quote.bid(), "6.01");
    }
}
