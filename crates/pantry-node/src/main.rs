//! Pantry Node - community cookbook and tool sharing service.
//!
//! This is the main entry point for running a Pantry node.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

use pantry_node::api::{create_router, AppState};
use pantry_node::config::Config;
use pantry_node::observability::{init_logging, LogFormat};

/// Pantry Node - cookbook and tool sharing for communities
#[derive(Parser, Debug)]
#[command(name = "pantry-node")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// API listen address (overrides the config file)
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json)
    #[arg(long)]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = if args.config.exists() {
        match Config::load(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("error: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let api_addr = args.api_addr.unwrap_or(config.bind_addr);
    let log_level = args.log_level.unwrap_or(config.log_level);
    let log_format = LogFormat::parse(&args.log_format.unwrap_or(config.log_format));

    init_logging(&log_level, log_format == LogFormat::Json);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting Pantry node");
    tracing::info!(api_addr = %api_addr, "Node configuration");

    let state = AppState::new();
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(api_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %api_addr, "Failed to bind API address");
            std::process::exit(1);
        }
    };

    tracing::info!(addr = %api_addr, "Pantry node is ready. Press Ctrl+C to stop.");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
