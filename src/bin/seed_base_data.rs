use anyhow::{Context, Result};
use clap::Parser;
use stockroom::{
    config::ConfigLoader,
    db,
    seeds::{backfill_companies_feature, seed_base_data, sync_standard_groups},
    telemetry::init_tracing,
};

/// Populate base data for the companies and warehouse apps.
#[derive(Debug, Parser)]
#[command(name = "seed_base_data", version)]
struct Args {
    /// Override the default owner password for all seeded owners
    #[arg(long)]
    owner_password: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new().load().context("loading configuration")?;
    init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&db).await.context("running migrations")?;

    sync_standard_groups(&db).await?;
    backfill_companies_feature(&db).await?;
    let summary = seed_base_data(&db, args.owner_password.as_deref()).await?;

    tracing::info!(
        companies_created = summary.companies_created,
        owners_created = summary.owners_created,
        items_created = summary.items_created,
        "Base data populated successfully"
    );
    Ok(())
}
