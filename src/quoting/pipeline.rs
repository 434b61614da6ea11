//! The fetch → extract → persist pipeline.
//!
//! Stages run strictly in order and the chain stops at the first failure.
//! Fetch and persist each get a fresh [`Deadline`] from their own fixed
//! budget when the stage starts.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::observability::metrics;
use crate::quoting::extractor::{ExtractError, QuoteExtractor};
use crate::quoting::fetcher::FetchError;
use crate::quoting::types::Quote;
use crate::resilience::Deadline;
use crate::storage::PersistError;

/// Where raw quote documents come from.
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    async fn fetch(&self, deadline: Deadline) -> Result<Bytes, FetchError>;
}

/// Where decoded quotes are recorded.
#[async_trait]
pub trait QuoteSink: Send + Sync + 'static {
    async fn persist(&self, quote: &Quote, deadline: Deadline) -> Result<(), PersistError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Persist,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Persist => "persist",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The first stage failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The pipeline task ended without delivering a result.
    #[error("pipeline task aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Fetch(_) => Some(Stage::Fetch),
            PipelineError::Extract(_) => Some(Stage::Extract),
            PipelineError::Persist(_) => Some(Stage::Persist),
            PipelineError::Aborted(_) => None,
        }
    }
}

/// Stage budgets for one pipeline.
#[derive(Debug, Clone, Copy)]
pub struct StageBudgets {
    pub fetch: Duration,
    pub persist: Duration,
}

pub struct QuotePipeline {
    source: Arc<dyn QuoteSource>,
    extractor: QuoteExtractor,
    sink: Arc<dyn QuoteSink>,
    budgets: StageBudgets,
}

impl QuotePipeline {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        extractor: QuoteExtractor,
        sink: Arc<dyn QuoteSink>,
        budgets: StageBudgets,
    ) -> Self {
        Self {
            source,
            extractor,
            sink,
            budgets,
        }
    }

    /// Run all three stages once. No retries.
    pub async fn run(&self) -> Result<Quote, PipelineError> {
        let started = Instant::now();
        let payload = self
            .source
            .fetch(Deadline::after(self.budgets.fetch))
            .await;
        metrics::record_stage(Stage::Fetch, payload.is_ok(), started);
        let payload = payload?;

        let started = Instant::now();
        let quote = self.extractor.extract(&payload);
        metrics::record_stage(Stage::Extract, quote.is_ok(), started);
        let quote = quote?;

        let started = Instant::now();
        let persisted = self
            .sink
            .persist(&quote, Deadline::after(self.budgets.persist))
            .await;
        metrics::record_stage(Stage::Persist, persisted.is_ok(), started);
        persisted?;

        Ok(quote)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use std::sync::atomic::Ordering;

    const OK_PAYLOAD: &str = r#"{"USDBRL":{"bid":"5.12"}}"#;

    #[tokio::test(start_paused = true)]
    async fn test_all_stages_succeed() {
        let source = Arc::new(FakeSource::payload(OK_PAYLOAD));
        let sink = Arc::new(FakeSink::default());
        let quote = pipeline(source.clone(), sink.clone()).run().await.unwrap();

        assert_eq!(quote.bid(), "5.12");
        assert_eq!(sink.rows(), vec!["5.12".to_string()]);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_short_circuits() {
        let source = Arc::new(FakeSource::payload(OK_PAYLOAD).with_delay(Duration::from_millis(300)));
        let sink = Arc::new(FakeSink::default());
        let err = pipeline(source.clone(), sink.clone()).run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(FetchError::Timeout(_))));
        assert_eq!(err.stage(), Some(Stage::Fetch));
        assert!(sink.rows().is_empty());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1, "no retry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_status_short_circuits() {
        let source = Arc::new(FakeSource {
            behavior: SourceBehavior::Status(reqwest::StatusCode::BAD_GATEWAY),
            delay: Duration::ZERO,
            calls: Default::default(),
        });
        let sink = Arc::new(FakeSink::default());
        let err = pipeline(source, sink.clone()).run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Fetch(FetchError::UpstreamStatus { .. })));
        assert!(sink.rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_failure_never_reaches_sink() {
        let source = Arc::new(FakeSource::payload(r#"{"USDBRL":{"ask":"5.13"}}"#));
        let sink = Arc::new(FakeSink::default());
        let err = pipeline(source, sink.clone()).run().await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Extract));
        assert!(sink.rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persist_budget_is_independent_of_fetch() {
        // Fetch uses most of its budget; persist still gets its full 10ms.
        let source = Arc::new(FakeSource::payload(OK_PAYLOAD).with_delay(Duration::from_millis(195)));
        let sink = Arc::new(FakeSink::with_delay(Duration::from_millis(8)));
        let quote = pipeline(source, sink.clone()).run().await.unwrap();
        assert_eq!(quote.bid(), "5.12");
        assert_eq!(sink.rows().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_persist_timeout() {
        let source = Arc::new(FakeSource::payload(OK_PAYLOAD));
        let sink = Arc::new(FakeSink::with_delay(Duration::from_millis(50)));
        let err = pipeline(source, sink.clone()).run().await.unwrap_err();

        assert!(matches!(err, PipelineError::Persist(PersistError::Timeout(d)) if d == Duration::from_millis(10)));
        assert!(sink.rows().is_empty());
    }
}
