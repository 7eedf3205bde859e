mod config;
mod dispatcher;
mod error;
mod platform;
mod request;
mod server;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dispatcher::Dispatcher;
use crate::server::AppState;

fn status(configured: bool) -> &'static str {
    if configured {
        "configured"
    } else {
        "missing credentials"
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,socialpost=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Missing credentials are reported per request, not here.
    info!("Configuration loaded successfully");
    info!("  Telegram: {}", status(config.telegram.is_configured()));
    info!("  Instagram: {}", status(config.instagram.is_configured()));
    if config.instagram.default_image_url().is_some() {
        info!("  Instagram default image: set");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("socialpost/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let state = AppState::new(Dispatcher::new(&config, client));

    info!("Publish server is starting...");
    server::serve(&config.server.bind_addr, state).await?;

    Ok(())
}
