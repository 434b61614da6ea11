//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, store, server)
//! - Bind the listener and begin accepting traffic
//! - On the stop signal, drain in-flight requests for a bounded time
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The schema is created here, once, never on the request path
//! - Listeners start last (traffic only when ready)

use std::future::Future;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::RelayConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Drain, Shutdown};
use crate::observability::metrics;
use crate::quoting::fetcher::FetcherBuildError;
use crate::storage::{QuoteStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to open quote store: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to configure upstream: {0}")]
    Upstream(#[from] FetcherBuildError),

    #[error("listener error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Run until SIGINT/SIGTERM.
pub async fn run(config: RelayConfig) -> Result<(), StartupError> {
    run_until(config, signals::shutdown_signal()).await
}

/// Run until `stop` resolves, then shut down gracefully.
pub async fn run_until<F>(config: RelayConfig, stop: F) -> Result<(), StartupError>
where
    F: Future<Output = ()>,
{
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = QuoteStore::open(Path::new(&config.storage.path))?;
    let grace = Duration::from_secs(config.timeouts.shutdown_secs);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, store)?;
    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.clone()));

    tokio::select! {
        joined = &mut server_task => {
            joined??;
            return Ok(());
        }
        _ = stop => {}
    }

    tracing::info!("Shutting down server ...");
    shutdown.trigger();

    if let Drain::Finished(joined) = shutdown.drain(grace, server_task).await {
        joined??;
    }

    tracing::info!("Server stopped");
    Ok(())
}
