//! Schema migration command

use anyhow::{Context, Result};
use clap::Parser;

use tracker_core::TrackerConfig;
use tracker_server::db::{create_pool, migrations};

#[derive(Parser, Debug)]
pub struct MigrateArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Print migration names without connecting
    #[arg(long)]
    pub list: bool,
}

pub async fn run_migrate(args: MigrateArgs, mut config: TrackerConfig) -> Result<()> {
    if args.list {
        for name in migrations::names() {
            println!("{name}");
        }
        return Ok(());
    }

    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }
    let pool = create_pool(config.database_url()?)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;

    println!("✅ {} migrations applied", migrations::names().count());
    Ok(())
}
