//! # Database — PostgreSQL Storage Layer
//!
//! Async persistence for lights and buildings via `sqlx::PgPool`.
//!
//! ## Schema
//!
//! - `lights`: one row per claimed window, keyed by the window id's text form
//! - `buildings`: the seeded catalog plus per-building illumination state
//!
//! The schema lives in `migrations/001_skyline.sql` and is applied at startup.
//! Every statement is idempotent, so restarts against an existing database
//! are safe.
//!
//! ## Module Structure
//!
//! - [`lights`] — window upsert with capacity check, listing, reset
//! - [`buildings`] — catalog seeding, atomic pool selection, reset

mod buildings;
mod lights;

use anyhow::Result;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

const SCHEMA: &str = include_str!("../../migrations/001_skyline.sql");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// The URL is parsed manually so that usernames carrying a pooler suffix
    /// (`user.project-ref`) and percent-encoded passwords survive intact.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let url = url::Url::parse(database_url)?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username)
            .statement_cache_capacity(0);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        Ok(Database { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Health check: execute `SELECT 1` to verify database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
