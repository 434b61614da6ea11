use std::path::Path;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body of a successful `GET /cotacao`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub bid: String, // decimal kept as text
}

/// Errors surfaced to callers of [`QuoteClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("failed to write quote file: {0}")]
    Io(#[from] std::io::Error),
}

pub struct QuoteClient {
    client: Client,
    url: String,
    timeout: Duration,
}

impl QuoteClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        Self::with_client(Client::new(), url, timeout)
    }

    /// Use a preconfigured `reqwest::Client` (e.g. with proxies disabled).
    pub fn with_client(client: Client, url: &str, timeout: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            timeout,
        }
    }

    /// Request the current quote. The whole exchange, body included, must
    /// finish within the client's deadline. Never retried.
    pub async fn fetch_quote(&self) -> Result<QuoteResponse, ClientError> {
        match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout {
                url: self.url.clone(),
                timeout: self.timeout,
            }),
        }
    }

    async fn request(&self) -> Result<QuoteResponse, ClientError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status(status));
        }

        resp.json::<QuoteResponse>().await.map_err(ClientError::Decode)
    }
}

/// Line written to the quote file.
pub fn format_quote_line(quote: &QuoteResponse) -> String {
    format!("Dólar:{}\n", quote.bid)
}

/// Overwrite `path` with the formatted quote.
pub async fn write_quote_file(path: &Path, quote: &QuoteResponse) -> Result<(), ClientError> {
    tokio::fs::write(path, format_quote_line(quote)).await?;
    Ok(())
}
