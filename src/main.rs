//! Murmur Server
//!
//! Run with: cargo run -- --config config.toml
//!
//! Configuration is read from `--config`, or the first of
//! `~/.config/murmur/config.toml`, `/etc/murmur/config.toml`, `./config.toml`,
//! then overridden by `MURMUR_*` environment variables and finally by the
//! command-line flags. `RUST_LOG` overrides the configured log filter.

use anyhow::Context;
use clap::Parser;
use murmur::api::{serve, AppState};
use murmur::config::{generate_default_config, Config, LogFormat, LoggingConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "murmur")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time chat and presence hub")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default().context("loading default config")?,
    };
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting Murmur v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        max_connections = config.hub.max_connections,
        preview_length = config.hub.preview_length,
        "Hub configured"
    );

    let state = AppState::new(config.server.clone(), config.hub.clone());
    serve(state, &config.server)
        .await
        .context("running server")?;

    tracing::info!("Murmur stopped");
    Ok(())
}

/// Initialize tracing
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
