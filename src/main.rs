//! Client identity host server.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ TraceLayer / request ID / timeout
//!                         │
//!                         ▼
//!                     client_addr ──▶ AddressResolver (edge headers → peer)
//!                         │
//!                         ▼
//!                     guard ──────▶ ClientClassifier ──▶ PatternRegistry
//!                         │                                   ▲
//!                 403 ◀───┤                                   │
//!                         ▼                              admin API
//!                  /whoami, /health
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use client_identity::config::{load_config, watcher::ConfigWatcher, IdentityConfig};
use client_identity::lifecycle::{signals::shutdown_on_signal, Shutdown};
use client_identity::observability::{logging, metrics};
use client_identity::HttpServer;

#[derive(Parser)]
#[command(name = "client-identity")]
#[command(about = "Resolves client addresses and screens User-Agents", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => IdentityConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "client-identity starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        policy = config.guard.name(),
        trusted_headers = config.resolver.trusted_headers.len(),
        admin_enabled = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // The watcher must outlive the server; without a config file nothing is sent.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { shutdown_on_signal(&shutdown).await });

    let server = HttpServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
