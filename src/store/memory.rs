//! In-memory backend. Each model sits behind its own mutex, so every
//! read-check-write sequence (capacity check, unlit-pool selection) is a
//! single critical section.

use super::StoreError;
use crate::model::{next_timestamp, Building, BuildingSpec, Light, LightDraft, WindowId};
use crate::stats::SkylineStats;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering from poisoning.
fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct LightEntry {
    light: Light,
    /// Write order, breaks timestamp ties when listing.
    seq: u64,
}

#[derive(Default)]
struct LightTable {
    by_id: HashMap<WindowId, LightEntry>,
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

pub struct MemoryStore {
    lights: Mutex<LightTable>,
    /// Catalog order is preserved by the vector.
    buildings: Mutex<Vec<Building>>,
}

impl MemoryStore {
    pub fn new(catalog: &[BuildingSpec]) -> Self {
        MemoryStore {
            lights: Mutex::new(LightTable::default()),
            buildings: Mutex::new(catalog.iter().map(Building::unlit).collect()),
        }
    }

    // ── Window lights ───────────────────────────────────────────

    pub fn put_light(&self, draft: LightDraft, total_windows: u32) -> Result<Light, StoreError> {
        let mut table = lock_or_recover(&self.lights);
        if !table.by_id.contains_key(&draft.window_id)
            && table.by_id.len() as u64 >= u64::from(total_windows)
        {
            return Err(StoreError::Exhausted("All windows are already lit"));
        }
        let timestamp = next_timestamp(table.last_timestamp);
        table.last_timestamp = Some(timestamp);
        let seq = table.next_seq;
        table.next_seq += 1;

        let light = draft.into_light(timestamp);
        table.by_id.insert(
            light.window_id.clone(),
            LightEntry {
                light: light.clone(),
                seq,
            },
        );
        Ok(light)
    }

    pub fn get_light(&self, id: &WindowId) -> Option<Light> {
        lock_or_recover(&self.lights)
            .by_id
            .get(id)
            .map(|e| e.light.clone())
    }

    pub fn list_lights(&self) -> Vec<Light> {
        let table = lock_or_recover(&self.lights);
        let mut entries: Vec<&LightEntry> = table.by_id.values().collect();
        entries.sort_by_key(|e| (e.light.timestamp, e.seq));
        entries.into_iter().map(|e| e.light.clone()).collect()
    }

    pub fn reset_lights(&self) -> u64 {
        let mut table = lock_or_recover(&self.lights);
        let cleared = table.by_id.len() as u64;
        table.by_id.clear();
        cleared
    }

    pub fn light_stats(&self, total_windows: u32) -> SkylineStats {
        let lit = lock_or_recover(&self.lights).by_id.len() as u64;
        SkylineStats::from_counts(lit, u64::from(total_windows))
    }

    // ── Building pool ───────────────────────────────────────────

    pub fn list_buildings(&self) -> Vec<Building> {
        lock_or_recover(&self.buildings).clone()
    }

    pub fn get_building(&self, id: &str) -> Option<Building> {
        lock_or_recover(&self.buildings)
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    pub fn illuminate_any(&self, owner_name: &str, goal: &str) -> Result<Building, StoreError> {
        let mut buildings = lock_or_recover(&self.buildings);
        let unlit: Vec<usize> = buildings
            .iter()
            .enumerate()
            .filter(|(_, b)| !b.is_lit)
            .map(|(i, _)| i)
            .collect();
        let idx = *unlit
            .choose(&mut rand::thread_rng())
            .ok_or(StoreError::Exhausted("No unlit buildings available"))?;
        let building = &mut buildings[idx];
        building.light_up(owner_name, goal, next_timestamp(None));
        Ok(building.clone())
    }

    pub fn illuminate_building(
        &self,
        id: &str,
        owner_name: &str,
        goal: &str,
    ) -> Result<Building, StoreError> {
        let mut buildings = lock_or_recover(&self.buildings);
        let building = buildings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if building.is_lit {
            return Err(StoreError::Conflict(id.to_string()));
        }
        building.light_up(owner_name, goal, next_timestamp(None));
        Ok(building.clone())
    }

    pub fn reset_buildings(&self) -> u64 {
        let mut buildings = lock_or_recover(&self.buildings);
        let mut cleared = 0;
        for b in buildings.iter_mut().filter(|b| b.is_lit) {
            b.clear();
            cleared += 1;
        }
        cleared
    }

    pub fn building_stats(&self) -> SkylineStats {
        let buildings = lock_or_recover(&self.buildings);
        let lit = buildings.iter().filter(|b| b.is_lit).count() as u64;
        SkylineStats::from_counts(lit, buildings.len() as u64)
    }
}
