//! # Stockroom Main Entry Point

use anyhow::Context;
use stockroom::{
    config::ConfigLoader,
    db::{init_pool, run_migrations},
    seeds::{backfill_companies_feature, sync_standard_groups},
    server::run_server,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from layered env files and variables
    let config = ConfigLoader::new()
        .load()
        .context("Failed to load configuration")?;

    init_tracing(&config).context("Failed to initialise tracing")?;
    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    run_migrations(&db).await?;

    sync_standard_groups(&db)
        .await
        .context("Failed to synchronise standard groups")?;
    backfill_companies_feature(&db)
        .await
        .context("Failed to backfill default features")?;

    run_server(config, db).await
}
