//! TOML configuration structs, parsing, and validation.
//!
//! A config file is optional. Every key has a default, and CLI flags override
//! file values:
//!
//! ```toml
//! [server]
//! port = 5000
//!
//! [skyline]
//! total_windows = 5000
//! default_color = "yellow"
//!
//! [[buildings]]
//! id = "b1"
//! name = "Terminal Tower"
//! height = 280
//! width = 52
//! style = "tower"
//! z_index = 8
//! ```
//!
//! When any `[[buildings]]` table is present it replaces the default catalog.

use crate::catalog;
use crate::model::BuildingSpec;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_TOTAL_WINDOWS: u32 = 5000;
pub const DEFAULT_COLOR: &str = "yellow";

/// Raw file layout, before defaults are resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    server: ServerSection,
    skyline: SkylineSection,
    buildings: Vec<BuildingSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServerSection {
    port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SkylineSection {
    total_windows: Option<u32>,
    default_color: Option<String>,
}

/// Effective service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkylineConfig {
    pub port: u16,
    /// Capacity of the window-light model.
    pub total_windows: u32,
    /// Color assigned to lights submitted without one.
    pub default_color: String,
    pub catalog: Vec<BuildingSpec>,
}

impl Default for SkylineConfig {
    fn default() -> Self {
        SkylineConfig {
            port: DEFAULT_PORT,
            total_windows: DEFAULT_TOTAL_WINDOWS,
            default_color: DEFAULT_COLOR.to_string(),
            catalog: catalog::default_catalog(),
        }
    }
}

impl SkylineConfig {
    /// Load from an optional TOML file, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_toml_str(&text)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(text)?;
        let defaults = Self::default();
        Ok(SkylineConfig {
            port: file.server.port.unwrap_or(defaults.port),
            total_windows: file.skyline.total_windows.unwrap_or(defaults.total_windows),
            default_color: file
                .skyline
                .default_color
                .unwrap_or(defaults.default_color),
            catalog: if file.buildings.is_empty() {
                defaults.catalog
            } else {
                file.buildings
            },
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_windows == 0 {
            bail!("skyline.total_windows must be at least 1");
        }
        if self.default_color.trim().is_empty() {
            bail!("skyline.default_color must not be empty");
        }
        catalog::validate_catalog(&self.catalog)
    }
}
