//! # CLI Execution Functions
//!
//! Execution logic for each subcommand, kept out of `main.rs`.

use anyhow::Result;
use skyline::config::SkylineConfig;
use skyline::{api, store::Storage};
use std::path::Path;
use tracing::info;

use super::Cli;

pub fn run_serve(
    cli: &Cli,
    config: SkylineConfig,
    port: Option<u16>,
    static_dir: Option<&Path>,
) -> Result<()> {
    let port = port.unwrap_or(config.port);
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let storage = Storage::open(cli.database_url.as_deref(), &config).await?;
        api::run(storage, config, port, static_dir).await
    })
}

/// Maintenance commands act on shared state, which only exists in Postgres.
fn require_database_url(cli: &Cli) -> Result<&str> {
    cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })
}

pub fn run_stats(cli: &Cli, config: &SkylineConfig) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let (windows, buildings) = rt.block_on(async {
        let storage = Storage::open(Some(database_url), config).await?;
        let windows = storage.light_stats().await?;
        let buildings = storage.building_stats().await?;
        Ok::<_, anyhow::Error>((windows, buildings))
    })?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "windows": windows,
            "buildings": buildings,
        }))?
    );
    Ok(())
}

pub fn run_reset(cli: &Cli, config: &SkylineConfig) -> Result<()> {
    let database_url = require_database_url(cli)?;
    let rt = tokio::runtime::Runtime::new()?;
    let (lights, buildings) = rt.block_on(async {
        let storage = Storage::open(Some(database_url), config).await?;
        let lights = storage.reset_lights().await?;
        let buildings = storage.reset_buildings().await?;
        Ok::<_, anyhow::Error>((lights, buildings))
    })?;
    info!(
        cleared_lights = lights,
        cleared_buildings = buildings,
        "skyline reset"
    );
    println!("Skyline reset successfully");
    Ok(())
}

pub fn run_catalog(config: &SkylineConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&config.catalog)?);
    Ok(())
}
