use std::path::PathBuf;

use anyhow::Result;
use calsync_core::AppConfig;
use calsync_server::{AppState, app};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calsync-server")]
#[command(about = "Relay calendar events and CRM records between Outlook and Zoho CRM")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $CALSYNC_CONFIG or ~/.config/calsync/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match &cli.config {
        Some(path) => AppConfig::load_file(path)?,
        None => AppConfig::load()?,
    };
    let addr = config.server.socket_addr()?;
    let state = AppState::from_config(&config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "calsync-server listening");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
