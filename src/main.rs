use tracing_subscriber::{fmt, EnvFilter};

mod clients;
mod config;
mod models;
mod query;
mod storage;
mod sync;
mod transform;

use crate::config::Config;
use crate::sync::SyncEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load this crate's .env regardless of current working directory
    let _ = dotenvy::from_filename_override(concat!(env!("CARGO_MANIFEST_DIR"), "/.env"));
    let filter = EnvFilter::from_default_env().add_directive("info".parse()?);
    fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config = match Config::path_from_args(&args).and_then(Config::load) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "error getting config");
            std::process::exit(1);
        }
    };
    tracing::info!(
        app_url = %config.source.app_url,
        sync_back_n_days = config.sync_back_n_days,
        "syncing data"
    );

    let engine = SyncEngine::new(config);
    if let Err(e) = engine.run().await {
        tracing::error!(error = %e, "sync failed");
        std::process::exit(1);
    }
    Ok(())
}
