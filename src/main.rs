//! # Main — CLI Entry Point
//!
//! Routes CLI subcommands to the API server and to store maintenance tasks.
//!
//! ## Subcommands
//!
//! - `serve`: run the HTTP API.
//! - `stats`: print window and building stats as JSON (needs a database).
//! - `reset`: clear every light and unlight every building (needs a database).
//! - `catalog`: print the effective building catalog.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL store. Without it the
//!   `serve` keeps everything in memory, and `stats`/`reset` refuse to run.
//! - `--config` / `SKYLINE_CONFIG`: optional TOML file.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "skyline", about = "Light up a window on the city skyline")]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var). In-memory when unset.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Path to a TOML config file (port, window capacity, default color, catalog)
    #[arg(long, env = "SKYLINE_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (defaults to the config file value, then 5000)
        #[arg(long)]
        port: Option<u16>,
        /// Directory to serve static files from (the built client bundle)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
    /// Print window and building stats from the database as JSON
    Stats,
    /// Clear every light in the database and return every building to unlit
    Reset,
    /// Print the effective building catalog as JSON
    Catalog,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for container logs, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let config = skyline::config::SkylineConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve { port, static_dir } => {
            cli::run_serve(&cli, config, *port, static_dir.as_deref())
        }
        Commands::Stats => cli::run_stats(&cli, &config),
        Commands::Reset => cli::run_reset(&cli, &config),
        Commands::Catalog => cli::run_catalog(&config),
    }
}
