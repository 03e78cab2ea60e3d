//! Campus companion server - HTTP/WebSocket API for the assistant, history, events, and agenda.

use anyhow::Result;
use clap::Parser;
use companion_server::{config, logging, routes, state};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use config::Config;
use logging::{LogConfig, LogFormat};
use state::AppState;

/// Campus companion server.
#[derive(Parser, Debug)]
#[command(name = "companion-server")]
#[command(about = "HTTP/WebSocket API for the campus companion app")]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override port from config
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging (INFO level for all companion targets)
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace logging (TRACE level for everything)
    #[arg(long)]
    trace: bool,

    /// Quiet mode (WARN and ERROR only)
    #[arg(short, long)]
    quiet: bool,

    /// Set log level for specific targets (e.g., "catalog=debug").
    /// Can be specified multiple times. Targets are prefixed with "companion::" automatically.
    #[arg(long = "log", value_name = "TARGET=LEVEL")]
    log_overrides: Vec<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = LogConfig::from_cli(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        cli.log_overrides,
        cli.log_format,
    );
    logging::init(&log_config);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(port) = cli.port {
        config.port = port;
    }

    tracing::info!(target: "companion::startup", "Loaded configuration (port: {})", config.port);
    tracing::debug!(target: "companion::startup", "{:?}", config);

    let state = Arc::new(AppState::new(config.clone())?);
    tracing::info!(
        target: "companion::startup",
        "Opened history at {:?} ({} interactions)",
        config.db_path,
        state.interactions.count()?
    );

    spawn_initial_catalog_load(state.clone());

    let app = routes::router(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!(target: "companion::startup", "Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Fetch the event catalog once in the background so startup does not wait
/// on the network. A failure leaves the catalog empty until a client asks.
fn spawn_initial_catalog_load(state: Arc<AppState>) {
    tokio::spawn(async move {
        match state.catalog.load().await {
            Ok(events) => {
                tracing::info!(target: "companion::startup", "Event catalog ready ({} events)", events.len());
            }
            Err(e) => {
                tracing::warn!(target: "companion::startup", "Initial event catalog load failed: {}", e);
            }
        }
    });
}
