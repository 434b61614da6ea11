use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use quote_relay::config::{load_or_default, ClientConfig};
use quote_relay::observability::logging::init_logging;
use quote_sdk::{write_quote_file, QuoteClient};

#[derive(Parser)]
#[command(name = "quote-client")]
#[command(about = "Fetch the current quote from the relay and save it to a file", long_about = None)]
struct Cli {
    /// TOML configuration file; its [client] section supplies defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Relay endpoint.
    #[arg(short, long)]
    url: Option<String>,

    /// Client-side deadline in milliseconds.
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// File to overwrite with the quote.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn resolve(&self, defaults: ClientConfig) -> (String, Duration, PathBuf) {
        let url = self.url.clone().unwrap_or(defaults.server_url);
        let timeout = Duration::from_millis(self.timeout_ms.unwrap_or(defaults.timeout_ms));
        let output = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(defaults.output_path));
        (url, timeout, output)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;
    init_logging(&config.observability);

    let (url, timeout, output) = cli.resolve(config.client);
    let client = QuoteClient::new(&url, timeout);

    let quote = match client.fetch_quote().await {
        Ok(quote) => quote,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Quote request failed");
            return Ok(ExitCode::FAILURE);
        }
    };

    write_quote_file(&output, &quote).await?;
    tracing::info!(bid = %quote.bid, path = %output.display(), "Quote saved");
    Ok(ExitCode::SUCCESS)
}
