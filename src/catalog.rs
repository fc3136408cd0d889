//! Default building catalog for the skyline, seeded once at startup.

use crate::model::{BuildingSpec, Style};
use anyhow::{bail, Result};
use std::collections::HashSet;

/// (id, name, height, width, style, z_index)
const DEFAULT_BUILDINGS: [(&str, &str, i32, i32, Style, i32); 15] = [
    ("b1", "Building 1", 100, 28, Style::Modern, 1),
    ("b2", "Building 2", 140, 32, Style::Classic, 2),
    ("b3", "Building 3", 180, 38, Style::Modern, 3),
    ("b4", "200 Public Square", 220, 50, Style::Tower, 4),
    ("b5", "Building 5", 260, 42, Style::Modern, 5),
    ("b6", "Key Tower", 320, 58, Style::Spire, 10),
    ("b7", "Terminal Tower", 280, 52, Style::Tower, 8),
    ("b8", "Building 8", 240, 44, Style::Classic, 6),
    ("b9", "Building 9", 200, 40, Style::Modern, 4),
    ("b10", "Building 10", 160, 36, Style::Tower, 3),
    ("b11", "Building 11", 130, 34, Style::Modern, 2),
    ("b12", "Building 12", 110, 30, Style::Classic, 1),
    ("b13", "Building 13", 90, 26, Style::Modern, 1),
    ("b14", "Building 14", 150, 35, Style::Tower, 2),
    ("b15", "Building 15", 190, 42, Style::Classic, 3),
];

pub fn default_catalog() -> Vec<BuildingSpec> {
    DEFAULT_BUILDINGS
        .iter()
        .map(|&(id, name, height, width, style, z_index)| BuildingSpec {
            id: id.to_string(),
            name: name.to_string(),
            height,
            width,
            style,
            z_index,
        })
        .collect()
}

/// Reject catalogs with empty or duplicate ids, or non-positive dimensions.
pub fn validate_catalog(catalog: &[BuildingSpec]) -> Result<()> {
    if catalog.is_empty() {
        bail!("building catalog is empty");
    }
    let mut seen = HashSet::new();
    for spec in catalog {
        if spec.id.trim().is_empty() {
            bail!("building '{}' has an empty id", spec.name);
        }
        if !seen.insert(spec.id.as_str()) {
            bail!("duplicate building id '{}'", spec.id);
        }
        if spec.height <= 0 || spec.width <= 0 {
            bail!("building '{}' must have positive height and width", spec.id);
        }
    }
    Ok(())
}
