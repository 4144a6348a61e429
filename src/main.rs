use std::sync::Arc;

use models::{App, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod browser;
mod cli;
mod config;
mod extractor;
mod models;
mod pipeline;
mod scorer;
mod sheet;

use config::{load_config, Config};
use tokio::signal;

const LOG_FILE: &str = "scraper.log";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Console mirror plus an append-only log file.
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)?;
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("contact_scraper=info")),
        )
        .with(fmt::layer())
        .with(fmt::layer().with_writer(Arc::new(log_file)).with_ansi(false))
        .init();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    let app = App::new(config);

    tokio::select! {
        result = app.run() => {
            result?;
        }
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    Ok(())
}
