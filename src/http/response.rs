//! Response mapping.
//!
//! # Responsibilities
//! - Turn an orchestration [`Outcome`] into exactly one HTTP response
//! - Map stage failures to status codes
//! - Keep internal error detail in the log, out of the body
//!
//! # Status Mapping
//! ```text
//! Succeeded                       → 200 {"bid": "..."}
//! fetch timeout                   → 504
//! fetch transport / non-2xx       → 500
//! extract failure                 → 500
//! persist failure (any)           → 504
//! pipeline aborted                → 500
//! Cancelled                       → 499, empty (the caller is gone)
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::quoting::{Outcome, PipelineError};

/// Map a pipeline failure to the status the caller sees.
pub fn status_for(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::Fetch(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
        PipelineError::Fetch(_) | PipelineError::Extract(_) | PipelineError::Aborted(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PipelineError::Persist(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}

fn public_message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::GATEWAY_TIMEOUT => "Quote service timed out",
        _ => "Quote unavailable",
    }
}

/// nginx's "client closed request"; nobody is listening for it.
pub(crate) fn client_closed_request() -> StatusCode {
    StatusCode::from_u16(499).unwrap_or(StatusCode::NO_CONTENT)
}

fn failure_response(err: &PipelineError) -> Response {
    let status = status_for(err);
    tracing::error!(
        stage = err.stage().map(|s| s.as_str()).unwrap_or("none"),
        status = status.as_u16(),
        error = %err,
        "Quote pipeline failed"
    );
    (status, public_message(status)).into_response()
}

pub fn outcome_response(outcome: Outcome) -> Response {
    match outcome {
        Outcome::Succeeded(quote) => {
            tracing::info!(bid = quote.bid(), "Quote served");
            (StatusCode::OK, Json(quote)).into_response()
        }
        Outcome::FailedUpstream(err) | Outcome::FailedPersist(err) => failure_response(&err),
        Outcome::Cancelled => client_closed_request().into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quoting::{ExtractError, FetchError, Quote};
    use crate::storage::{PersistError, StoreError};
    use axum::body::to_bytes;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        let timeout = PipelineError::Fetch(FetchError::Timeout(Duration::from_millis(200)));
        assert_eq!(status_for(&timeout), StatusCode::GATEWAY_TIMEOUT);

        let upstream = PipelineError::Fetch(FetchError::UpstreamStatus {
            status: StatusCode::SERVICE_UNAVAILABLE,
        });
        assert_eq!(status_for(&upstream), StatusCode::INTERNAL_SERVER_ERROR);

        let extract = PipelineError::Extract(ExtractError::MissingPair("USDBRL".into()));
        assert_eq!(status_for(&extract), StatusCode::INTERNAL_SERVER_ERROR);

        let persist_timeout = PipelineError::Persist(PersistError::Timeout(Duration::from_millis(10)));
        assert_eq!(status_for(&persist_timeout), StatusCode::GATEWAY_TIMEOUT);

        let persist_error = PipelineError::Persist(PersistError::Storage(StoreError::Database(
            "disk I/O error".into(),
        )));
        assert_eq!(status_for(&persist_error), StatusCode::GATEWAY_TIMEOUT);

        let aborted = PipelineError::Aborted("panic".into());
        assert_eq!(status_for(&aborted), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_success_body() {
        let response = outcome_response(Outcome::Succeeded(Quote::new("5.12").unwrap()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], br#"{"bid":"5.12"}"#);
    }

    #[tokio::test]
    async fn test_failure_body_hides_detail() {
        let err = PipelineError::Persist(PersistError::Storage(StoreError::Database(
            "database is locked".into(),
        )));
        let response = outcome_response(Outcome::FailedPersist(err));
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("locked"));
    }

    #[tokio::test]
    async fn test_cancelled_has_no_body() {
        let response = outcome_response(Outcome::Cancelled);
        assert_eq!(response.status().as_u16(), 499);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }
}
