//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, request timeout)
//! - Assemble the quote pipeline from configuration
//! - Serve until the shutdown signal arrives

use axum::{body::Body, http::Request, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RelayConfig;
use crate::http::quote;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::lifecycle::Shutdown;
use crate::quoting::fetcher::FetcherBuildError;
use crate::quoting::{Orchestrator, QuoteExtractor, QuotePipeline, StageBudgets, UpstreamFetcher};
use crate::storage::QuoteStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// HTTP server for the quote relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server fetching from the configured upstream and writing to `store`.
    pub fn new(config: RelayConfig, store: QuoteStore) -> Result<Self, FetcherBuildError> {
        let fetcher = UpstreamFetcher::from_config(&config.upstream)?;
        let pipeline = QuotePipeline::new(
            Arc::new(fetcher),
            QuoteExtractor::new(config.upstream.pair.clone()),
            Arc::new(store),
            StageBudgets {
                fetch: config.upstream.timeout(),
                persist: config.storage.timeout(),
            },
        );
        Ok(Self::with_pipeline(config, pipeline))
    }

    /// Create a server around an already assembled pipeline.
    pub fn with_pipeline(config: RelayConfig, pipeline: QuotePipeline) -> Self {
        let state = AppState {
            orchestrator: Orchestrator::new(Arc::new(pipeline)),
        };
        Self {
            router: Self::build_router(&config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request.headers().request_id(),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/cotacao", get(quote::get_quote))
            .route("/health", get(quote::health))
            .with_state(state)
            .layer(middleware)
    }

    /// Run the server, accepting connections until `shutdown` fires.
    /// In-flight requests are drained before this returns.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.triggered().await;
                tracing::info!("HTTP server draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    #[cfg(test)]
    fn router(&self) -> Router {
        self.router.clone()
    }
}
