use axum::{extract::State, response::Response};
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::http::response::{client_closed_request, outcome_response};
use crate::http::server::AppState;
use crate::observability::metrics;

/// Live for the duration of one `/cotacao` request.
///
/// The connection layer drops the handler future when the caller goes away
/// (or the server-wide request timeout fires). Nothing polls the handler after
/// that, so the cancellation is recorded here rather than by the orchestrator.
struct InFlight {
    cancel: CancellationToken,
    start: Instant,
    answered: bool,
}

impl InFlight {
    fn new(start: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            start,
            answered: false,
        }
    }

    fn answered(mut self) {
        self.answered = true;
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if self.answered {
            return;
        }
        self.cancel.cancel();
        tracing::info!(
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            "Connection closed by caller before the quote was ready"
        );
        metrics::record_request(client_closed_request().as_u16(), "cancelled", self.start);
    }
}

/// `GET /cotacao`
pub async fn get_quote(State(state): State<AppState>) -> Response {
    let start = Instant::now();
    let in_flight = InFlight::new(start);

    let outcome = state.orchestrator.handle(in_flight.cancel.clone()).await;
    let label = outcome.label();
    let response = outcome_response(outcome);

    metrics::record_request(response.status().as_u16(), label, start);
    in_flight.answered();
    response
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quoting::pipeline::testing::*;
    use crate::quoting::Orchestrator;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
    use std::sync::Arc;
    use std::time::Duration;

    fn cancelled_count(recorder: &PrometheusRecorder) -> Option<String> {
        recorder
            .handle()
            .render()
            .lines()
            .find(|line| {
                line.starts_with("quote_requests_total{")
                    && line.contains(r#"outcome="cancelled""#)
                    && line.contains(r#"status="499""#)
            })
            .map(|line| line.rsplit(' ').next().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn test_dropped_handler_records_cancellation() {
        let sink = Arc::new(FakeSink::default());
        let source = FakeSource::payload(r#"{"USDBRL":{"bid":"5.12"}}"#)
            .with_delay(Duration::from_millis(150));
        let state = AppState {
            orchestrator: Orchestrator::new(Arc::new(pipeline(Arc::new(source), sink.clone()))),
        };

        let mut handler = Box::pin(get_quote(State(state)));
        assert!(tokio::time::timeout(Duration::from_millis(20), &mut handler)
            .await
            .is_err());

        // The caller disconnects: the connection layer drops the handler.
        let recorder = PrometheusBuilder::new().build_recorder();
        ::metrics::with_local_recorder(&recorder, || drop(handler));
        assert_eq!(cancelled_count(&recorder).as_deref(), Some("1"));

        // The pipeline still finishes in the background.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(sink.rows(), vec!["5.12".to_string()]);
    }

    #[test]
    fn test_answered_request_is_not_counted_as_cancelled() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let in_flight = InFlight::new(Instant::now());
        let cancel = in_flight.cancel.clone();

        ::metrics::with_local_recorder(&recorder, || in_flight.answered());
        assert_eq!(cancelled_count(&recorder), None);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn test_unanswered_request_cancels_token() {
        let in_flight = InFlight::new(Instant::now());
        let cancel = in_flight.cancel.clone();
        drop(in_flight);
        assert!(cancel.is_cancelled());
    }
}
