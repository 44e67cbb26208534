use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use relaygate_core::{AppState, CliArgs, ConfigStore};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CliArgs::parse();
    let config_store = ConfigStore::load_from_settings(args)?;
    let host = config_store.load().host.clone();
    let port = config_store.load().port;

    let state = Arc::new(AppState::new(config_store));
    let app = relaygate_router::build_router(state);

    let bind = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(event = "listening", addr = %bind);
    axum::serve(listener, app).await?;
    Ok(())
}
