//! Orderhub server binary.
//!
//! Loads configuration (defaults, YAML file, `ORDERHUB_` environment
//! overrides), validates it, then serves the orders API behind the
//! authentication middleware until interrupted.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use orderhub_server::bootstrap;
use orderhub_server::config::{AppConfig, LoggingConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Orderhub - paginated orders API with delegated invoice retrieval
#[derive(Parser, Debug)]
#[command(name = "orderhub-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(args.config.as_deref())?;
    init_tracing(&config.logging);

    if args.print_config {
        print_config(&config);
        return Ok(());
    }

    // Misconfiguration aborts before the listener binds.
    config.validate()?;

    let router = bootstrap::build_router(&config)?;

    let addr: SocketAddr = config.server.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, version = env!("CARGO_PKG_VERSION"), "orderhub server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("orderhub server stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter.clone()));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Secrets are `SecretString` and print redacted.
#[allow(clippy::use_debug)]
fn print_config(config: &AppConfig) {
    println!("{config:#?}");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install ctrl-c handler: {e}");
        return;
    }
    tracing::info!("shutdown signal received");
}
