//! TRON transaction signing service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────────┐
//!                        │                      SIGNER                           │
//!                        │                                                       │
//!   POST /sign           │  ┌──────┐   ┌───────────┐   ┌─────────┐   ┌────────┐  │
//!   ─────────────────────┼─▶│ auth │──▶│ normalize │──▶│ builder │──▶│ signer │  │
//!                        │  └──────┘   └───────────┘   └────┬────┘   └───┬────┘  │
//!                        │                                  │            │       │
//!                        │                   per-account lock held ──────┤       │
//!                        │                                  ▼            ▼       │
//!   JSON response        │  ┌───────────┐              ┌─────────────────────┐   │     TRON
//!   ◀────────────────────┼──│ formatter │◀─────────────│     broadcaster     │◀──┼──▶  node
//!                        │  └───────────┘              └─────────────────────┘   │
//!                        │                                                       │
//!                        │  config · observability · lifecycle                   │
//!                        └───────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::net::TcpListener;

use tron_signer::config::load_config;
use tron_signer::http::HttpServer;
use tron_signer::lifecycle::{build_state, shutdown_signal, Shutdown};
use tron_signer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "tron-signer")]
#[command(about = "Signs and broadcasts TRON transfers", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "SIGNER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Configuration rejected");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("tron-signer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        node = %config.node.base_url,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    match run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Signer failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: tron_signer::SignerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state(&config)?;

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    let pipeline = state.pipeline.clone();
    let server = HttpServer::new(config, state);
    let server_shutdown = shutdown.subscribe();
    let mut handle = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        _ = shutdown_signal() => {
            shutdown.trigger();
            handle.await??;
        }
        result = &mut handle => result??,
    }

    shutdown.drain(pipeline.in_flight(), grace).await;
    Ok(())
}
