//! # Store — Illumination State
//!
//! [`Storage`] is the single owner of all lights and buildings. It is built
//! once at process start and shared with request handlers through the app
//! state. Two backends implement the same operations:
//!
//! - [`MemoryStore`] — process-lifetime maps behind mutexes (default).
//! - [`Database`] — PostgreSQL tables, selected when a database URL is given.
//!
//! Both backends make capacity checks and unlit-pool selection atomic, so two
//! concurrent requests can never be handed the same building.

mod memory;

pub use memory::MemoryStore;

use crate::config::SkylineConfig;
use crate::db::Database;
use crate::model::{Building, Light, LightDraft, WindowId};
use crate::stats::SkylineStats;
use anyhow::Result;
use tracing::info;

/// Failures of a store operation, mapped to HTTP statuses by the API layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No capacity left in the targeted model.
    #[error("{0}")]
    Exhausted(&'static str),
    #[error("Building {0} not found")]
    NotFound(String),
    #[error("Building {0} is already illuminated")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

enum Backend {
    Memory(MemoryStore),
    Postgres(Database),
}

pub struct Storage {
    backend: Backend,
    total_windows: u32,
}

impl Storage {
    pub fn in_memory(config: &SkylineConfig) -> Self {
        Storage {
            backend: Backend::Memory(MemoryStore::new(&config.catalog)),
            total_windows: config.total_windows,
        }
    }

    /// Wrap a connected database, applying migrations and seeding the catalog.
    pub async fn postgres(db: Database, config: &SkylineConfig) -> Result<Self> {
        db.migrate().await?;
        db.seed_catalog(&config.catalog).await?;
        Ok(Storage {
            backend: Backend::Postgres(db),
            total_windows: config.total_windows,
        })
    }

    /// Postgres when a URL is given, in-memory otherwise.
    pub async fn open(database_url: Option<&str>, config: &SkylineConfig) -> Result<Self> {
        let storage = match database_url {
            Some(url) => Self::postgres(Database::connect(url).await?, config).await?,
            None => Self::in_memory(config),
        };
        info!(
            backend = storage.backend_name(),
            total_windows = config.total_windows,
            buildings = config.catalog.len(),
            "storage ready"
        );
        Ok(storage)
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Memory(_) => "memory",
            Backend::Postgres(_) => "postgres",
        }
    }

    pub fn total_windows(&self) -> u32 {
        self.total_windows
    }

    pub async fn health_check(&self) -> Result<()> {
        match &self.backend {
            Backend::Memory(_) => Ok(()),
            Backend::Postgres(db) => db.health_check().await,
        }
    }

    // ── Window lights ───────────────────────────────────────────

    /// Insert or overwrite the light for `draft.window_id`.
    pub async fn put_light(&self, draft: LightDraft) -> Result<Light, StoreError> {
        match &self.backend {
            Backend::Memory(m) => m.put_light(draft, self.total_windows),
            Backend::Postgres(db) => db.upsert_light(draft, self.total_windows).await,
        }
    }

    pub async fn get_light(&self, id: &WindowId) -> Result<Option<Light>, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_light(id)),
            Backend::Postgres(db) => db.get_light(id).await,
        }
    }

    /// All lights, oldest first.
    pub async fn list_lights(&self) -> Result<Vec<Light>, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_lights()),
            Backend::Postgres(db) => db.list_lights().await,
        }
    }

    pub async fn reset_lights(&self) -> Result<u64, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.reset_lights()),
            Backend::Postgres(db) => db.reset_lights().await,
        }
    }

    pub async fn light_stats(&self) -> Result<SkylineStats, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.light_stats(self.total_windows)),
            Backend::Postgres(db) => {
                let lit = db.count_lights().await?;
                Ok(SkylineStats::from_counts(lit, u64::from(self.total_windows)))
            }
        }
    }

    // ── Building pool ───────────────────────────────────────────

    /// All buildings in catalog order.
    pub async fn list_buildings(&self) -> Result<Vec<Building>, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.list_buildings()),
            Backend::Postgres(db) => db.list_buildings().await,
        }
    }

    pub async fn get_building(&self, id: &str) -> Result<Option<Building>, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.get_building(id)),
            Backend::Postgres(db) => db.get_building(id).await,
        }
    }

    /// Pick one unlit building at random and light it, atomically.
    pub async fn illuminate_any(&self, owner_name: &str, goal: &str) -> Result<Building, StoreError> {
        match &self.backend {
            Backend::Memory(m) => m.illuminate_any(owner_name, goal),
            Backend::Postgres(db) => db.illuminate_any(owner_name, goal).await,
        }
    }

    /// Light a specific building; it must exist and be unlit.
    pub async fn illuminate_building(
        &self,
        id: &str,
        owner_name: &str,
        goal: &str,
    ) -> Result<Building, StoreError> {
        match &self.backend {
            Backend::Memory(m) => m.illuminate_building(id, owner_name, goal),
            Backend::Postgres(db) => db.illuminate_building(id, owner_name, goal).await,
        }
    }

    pub async fn reset_buildings(&self) -> Result<u64, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.reset_buildings()),
            Backend::Postgres(db) => db.reset_buildings().await,
        }
    }

    pub async fn building_stats(&self) -> Result<SkylineStats, StoreError> {
        match &self.backend {
            Backend::Memory(m) => Ok(m.building_stats()),
            Backend::Postgres(db) => {
                let (lit, total) = db.count_buildings().await?;
                Ok(SkylineStats::from_counts(lit, total))
            }
        }
    }
}
