//! Articles service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────────────┐
//!                        │                  ARTICLES SERVICE                     │
//!                        │                                                       │
//!   Client Request       │  ┌───────────┐   ┌───────────┐   ┌──────────┐        │
//!   ─────────────────────┼─▶│  tracing  │──▶│ transport │──▶│ endpoint │        │
//!   (traceparent)        │  │middleware │   │  decode   │   │          │        │
//!                        │  └───────────┘   └───────────┘   └────┬─────┘        │
//!                        │                                       ▼              │
//!                        │                  ┌───────────┐   ┌──────────┐        │
//!                        │                  │ snapshot  │◀──│ service  │        │
//!                        │                  │  store    │   │          │        │
//!                        │                  └───────────┘   └────┬─────┘        │
//!                        │                                       ▼              │      Suggestions
//!   Client Response      │  ┌───────────┐                   ┌──────────┐        │      Service
//!   ◀────────────────────┼──│ transport │◀──────────────────│ gateway  │────────┼────▶ (traceparent)
//!                        │  │  encode   │                   └──────────┘        │
//!                        │  └───────────┘                                       │
//!                        └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use articles_service::config::load_config;
use articles_service::lifecycle::{build_server, build_telemetry, signals, Shutdown};
use articles_service::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "articles-service")]
#[command(about = "Serves articles and their suggestions with trace propagation", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_logging(&config.observability)?;

    tracing::info!("articles-service v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        suggestions_host = %config.suggestions.host,
        snapshot = %config.data_source.articles_path.display(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        metrics::init_metrics(config.observability.metrics_address.parse()?)?;
    }

    let telemetry = build_telemetry(&config.tracing)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = build_server(config, telemetry.clone())?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signals::shutdown_on_signal(&signal_shutdown).await {
            tracing::error!(error = %e, "Failed to install signal handlers");
        }
    });

    server.run(listener, server_shutdown).await?;
    telemetry.shutdown().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
