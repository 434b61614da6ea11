//! Currency Quote Relay
//!
//! Serves `GET /cotacao`: fetches the current USD/BRL quote from an upstream
//! API, records it in SQLite, and returns its bid, each step under its own
//! deadline.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                   QUOTE RELAY                    │
//!   GET /cotacao        │  ┌────────┐    ┌──────────────┐                  │
//!   ────────────────────┼─▶│  http  │───▶│ orchestrator │ races pipeline   │
//!                       │  │ server │    └──────┬───────┘ vs. cancellation │
//!                       │  └────────┘           │ spawn                    │
//!                       │                       ▼                          │
//!                       │  ┌─────────┐   ┌───────────┐   ┌─────────┐       │
//!                       │  │ fetcher │──▶│ extractor │──▶│ storage │       │
//!                       │  │  200ms  │   │   pure    │   │  10ms   │       │
//!                       │  └────┬────┘   └───────────┘   └────┬────┘       │
//!                       └───────┼─────────────────────────────┼────────────┘
//!                               ▼                             ▼
//!                         upstream API                  SQLite (quotes)
//! ```

use clap::Parser;
use std::path::PathBuf;

use quote_relay::config::load_or_default;
use quote_relay::lifecycle;
use quote_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "quote-relay")]
#[command(about = "Serves the latest currency quote under strict deadlines", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    init_logging(&config.observability);

    tracing::info!("quote-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.url,
        fetch_timeout_ms = config.upstream.timeout_ms,
        persist_timeout_ms = config.storage.timeout_ms,
        "Configuration loaded"
    );

    lifecycle::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
