//! funky-proxy: an HTTP proxy that serves upstream images inverted.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ http::server ──▶ proxy::Orchestrator
//!                                   │  session (bind / resolve)
//!                                   │  upstream (fetch)
//!                                   │  transform (decode / invert / PNG)
//!     Client ◀── response ◀─────────┘
//!
//!     Cross-cutting: config (+ hot reload), observability, lifecycle, admin
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use funky_proxy::admin;
use funky_proxy::config::{load_config, ConfigWatcher, ProxyConfig};
use funky_proxy::http::HttpServer;
use funky_proxy::lifecycle::{signals::shutdown_on_signal, Shutdown};
use funky_proxy::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "funky-proxy")]
#[command(about = "HTTP proxy that colour-inverts the images it relays", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "funky-proxy starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        session_ttl_secs = config.session.ttl_secs,
        transform_enabled = config.transform.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: std::net::SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    let admin_config = config.admin.clone();
    let server = HttpServer::new(config)?;

    if admin_config.enabled {
        let admin_listener = TcpListener::bind(&admin_config.bind_address).await?;
        let state = server.state().clone();
        let rx = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve_admin(admin_listener, state, rx).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        });
    }

    // The watcher handle must outlive the server.
    let (config_updates, _watcher) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            tracing::info!(path = %path.display(), "Watching config for changes");
            (rx, Some(handle))
        }
        _ => (tokio::sync::mpsc::unbounded_channel().1, None),
    };

    server
        .run(listener, config_updates, shutdown.subscribe())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
