//! Tally - per-session calculator service.
//!
//! Usage:
//!   tally serve [--port 8080] [--ttl-secs 600] [--sweep-interval-secs 180]

use clap::{Parser, Subcommand};
use std::process::exit;
use std::time::Duration;
use tally::config::{Config, DEFAULT_SWEEP_INTERVAL_SECS};
use tally::session::DEFAULT_SESSION_TTL_SECS;
use tally::{http_server, AppState, Sweeper, MAX_ACTIONS};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Per-session calculator with replayable history")]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Session lifetime in seconds, counted from creation
        #[arg(long, default_value_t = DEFAULT_SESSION_TTL_SECS)]
        ttl_secs: u64,

        /// Seconds between two expiry sweeps
        #[arg(long, default_value_t = DEFAULT_SWEEP_INTERVAL_SECS)]
        sweep_interval_secs: u64,

        /// Actions remembered per session
        #[arg(long, default_value_t = MAX_ACTIONS)]
        max_actions: usize,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Serve {
            port,
            ttl_secs,
            sweep_interval_secs,
            max_actions,
        } => {
            let config = Config {
                session_ttl: Duration::from_secs(ttl_secs),
                sweep_interval: Duration::from_secs(sweep_interval_secs),
                max_actions,
            };
            let state = AppState::new(config.clone());
            let sweeper = Sweeper::start(state.store.clone(), config.sweep_interval);

            let result = http_server::run_server(port, state, shutdown_signal()).await;
            sweeper.stop().await;

            if let Err(e) = result {
                error!("Server error: {}", e);
                exit(1);
            }
            info!("Server stopped");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl+C received, shutting down...");
}
