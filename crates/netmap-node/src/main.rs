//! Network map service node.
//!
//! Configuration comes from a TOML file, `NETMAP_*` environment
//! variables, and command-line flags, in increasing precedence:
//!
//! - `NETMAP_PORT` - web port (default: 8080)
//! - `NETMAP_DB_DIR` - state directory (default: .db)
//! - `NETMAP_NOTARY_DIR` - watched notary directory (default: notary-certificates)
//! - `NETMAP_LOG_LEVEL` - log level (default: info)
//! - `NETMAP_LOG_FORMAT` - json or pretty (default: pretty)

use clap::Parser;
use netmap_node::bootstrap;
use netmap_node::config::NodeConfig;
use netmap_node::logging::{init_logging, LogFormat};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Network map service for a permissioned distributed ledger.
#[derive(Parser, Debug)]
#[command(name = "netmap-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "netmap.toml")]
    config: PathBuf,

    /// Web port (overrides config file and env)
    #[arg(long)]
    port: Option<u16>,

    /// State directory
    #[arg(long)]
    db_dir: Option<PathBuf>,

    /// Watched notary certificate directory
    #[arg(long)]
    notary_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        NodeConfig::from_file(&args.config).unwrap_or_else(|e| {
            eprintln!("Warning: failed to load config file: {e}. Using defaults.");
            NodeConfig::default()
        })
    } else {
        NodeConfig::default()
    };

    if let Err(e) = config.merge_env() {
        eprintln!("Warning: failed to merge environment config: {e}");
    }

    if let Some(port) = args.port {
        config.api.port = port;
    }
    if let Some(dir) = args.db_dir {
        config.storage.db_dir = dir;
    }
    if let Some(dir) = args.notary_dir {
        config.notary.watch_dir = dir;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        config.logging.format = format;
    }

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    }

    init_logging(&config.logging.level, LogFormat::parse(&config.logging.format));

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting network map service");
    tracing::info!(
        port = config.api.port,
        db_dir = %config.storage.db_dir.display(),
        notary_dir = %config.notary.watch_dir.display(),
        backend = %config.storage.backend,
        "Node configuration"
    );

    let service = bootstrap::build(&config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!(error = %e, %addr, "Failed to bind");
        e
    })?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, service.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Network map service stopped");
    Ok(())
}

/// Resolves when the process is asked to stop (ctrl-c, or SIGTERM on
/// Unix), so in-flight requests drain before the listener closes.
///
/// A handler that cannot be installed is logged and parked, leaving the
/// other signal as the only way to stop gracefully.
async fn shutdown_signal() {
    let signal = tokio::select! {
        () = interrupt() => "interrupt",
        () = sigterm() => "SIGTERM",
    };
    tracing::info!(%signal, "Stopping network map service");
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn sigterm() {
    std::future::pending::<()>().await;
}
