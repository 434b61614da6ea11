//! Upstream fetcher.
//!
//! # Responsibilities
//! - Issue exactly one GET to the quote source per call
//! - Bound the call, body included, by the caller-supplied deadline
//! - Classify failures as timeout, transport, or non-success status

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::quoting::pipeline::QuoteSource;
use crate::resilience::Deadline;

/// Failure of the fetch stage.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("upstream request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("upstream returned {status}")]
    UpstreamStatus { status: StatusCode },
}

impl FetchError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout(_))
    }
}

/// HTTP client for the configured quote source.
#[derive(Clone)]
pub struct UpstreamFetcher {
    client: Client,
    url: Url,
}

impl UpstreamFetcher {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Build the fetcher and its `reqwest::Client` from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, FetcherBuildError> {
        let url = Url::parse(&config.url)?;
        let mut builder = Client::builder();
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self::new(builder.build()?, url))
    }

    async fn request(&self) -> Result<Bytes, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UpstreamStatus { status });
        }

        response.bytes().await.map_err(FetchError::Transport)
    }
}

#[derive(Debug, Error)]
pub enum FetcherBuildError {
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

#[async_trait]
impl QuoteSource for UpstreamFetcher {
    async fn fetch(&self, deadline: Deadline) -> Result<Bytes, FetchError> {
        match deadline.run(self.request()).await {
            Ok(Err(FetchError::Transport(e))) if e.is_timeout() => {
                Err(FetchError::Timeout(deadline.budget()))
            }
            Ok(result) => result,
            Err(exceeded) => Err(FetchError::Timeout(exceeded.budget)),
        }
    }
}
