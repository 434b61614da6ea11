//! Per-request orchestration.
//!
//! # State Machine
//! ```text
//! Running ──pipeline Ok──────────────▶ Succeeded
//!    │────fetch / extract failure────▶ FailedUpstream
//!    │────persist failure────────────▶ FailedPersist
//!    └────cancellation fires first───▶ Cancelled   (pipeline keeps running,
//!                                                   its result is dropped)
//! ```
//!
//! The pipeline runs in its own task and reports through a oneshot channel,
//! so the caller can stop waiting without interrupting a stage mid-call.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::quoting::pipeline::{PipelineError, QuotePipeline, Stage};
use crate::quoting::types::Quote;

/// Final state of one request.
#[derive(Debug)]
pub enum Outcome {
    Succeeded(Quote),
    FailedUpstream(PipelineError),
    FailedPersist(PipelineError),
    Cancelled,
}

impl Outcome {
    fn from_result(result: Result<Quote, PipelineError>) -> Self {
        match result {
            Ok(quote) => Outcome::Succeeded(quote),
            Err(e) if e.stage() == Some(Stage::Persist) => Outcome::FailedPersist(e),
            Err(e) => Outcome::FailedUpstream(e),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Succeeded(_) => "succeeded",
            Outcome::FailedUpstream(_) => "failed_upstream",
            Outcome::FailedPersist(_) => "failed_persist",
            Outcome::Cancelled => "cancelled",
        }
    }
}

#[derive(Clone)]
pub struct Orchestrator {
    pipeline: Arc<QuotePipeline>,
}

impl Orchestrator {
    pub fn new(pipeline: Arc<QuotePipeline>) -> Self {
        Self { pipeline }
    }

    /// Run one pipeline and race it against `cancel`.
    ///
    /// Exactly one outcome is produced. When `cancel` wins, the spawned
    /// pipeline continues until its own stage deadlines end it.
    pub async fn handle(&self, cancel: CancellationToken) -> Outcome {
        let (tx, rx) = oneshot::channel();
        let pipeline = self.pipeline.clone();

        tokio::spawn(
            async move {
                let result = pipeline.run().await;
                if let Err(unclaimed) = tx.send(result) {
                    match unclaimed {
                        Ok(quote) => tracing::info!(
                            bid = quote.bid(),
                            "caller gone, discarding completed quote"
                        ),
                        Err(e) => tracing::info!(error = %e, "caller gone, discarding failure"),
                    }
                }
            }
            .in_current_span(),
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("request cancelled by caller");
                Outcome::Cancelled
            }
            result = rx => match result {
                Ok(result) => Outcome::from_result(result),
                Err(_) => Outcome::FailedUpstream(PipelineError::Aborted(
                    "pipeline task dropped its result".to_string(),
                )),
            },
        }
    }
}
