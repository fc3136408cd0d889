//! Building catalog operations.
//!
//! Random pool selection is a single `UPDATE ... WHERE id = (SELECT ... FOR
//! UPDATE SKIP LOCKED)` statement: concurrent requests skip rows another
//! transaction is lighting, so no building is ever handed out twice.

use super::Database;
use crate::model::{now_millis, Building, BuildingSpec};
use crate::store::StoreError;
use chrono::{DateTime, Utc};

const BUILDING_COLUMNS: &str =
    "id, name, height, width, style, z_index, is_lit, owner_name, goal, lit_at";

#[derive(sqlx::FromRow)]
struct BuildingRow {
    id: String,
    name: String,
    height: i32,
    width: i32,
    style: String,
    z_index: i32,
    is_lit: bool,
    owner_name: Option<String>,
    goal: Option<String>,
    lit_at: Option<DateTime<Utc>>,
}

impl TryFrom<BuildingRow> for Building {
    type Error = StoreError;

    fn try_from(row: BuildingRow) -> Result<Self, Self::Error> {
        let style = row
            .style
            .parse()
            .map_err(|e: anyhow::Error| StoreError::Database(sqlx::Error::Decode(e.into())))?;
        Ok(Building {
            id: row.id,
            name: row.name,
            height: row.height,
            width: row.width,
            style,
            z_index: row.z_index,
            is_lit: row.is_lit,
            owner_name: row.owner_name,
            goal: row.goal,
            lit_at: row.lit_at,
        })
    }
}

impl Database {
    /// Make the `buildings` table match the catalog. Presentation attributes
    /// are refreshed, illumination state of surviving buildings is kept, and
    /// buildings no longer in the catalog are removed.
    pub async fn seed_catalog(&self, catalog: &[BuildingSpec]) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        for (position, spec) in catalog.iter().enumerate() {
            sqlx::query(
                "INSERT INTO buildings (id, position, name, height, width, style, z_index)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)
                 ON CONFLICT (id) DO UPDATE SET
                   position = EXCLUDED.position,
                   name = EXCLUDED.name,
                   height = EXCLUDED.height,
                   width = EXCLUDED.width,
                   style = EXCLUDED.style,
                   z_index = EXCLUDED.z_index",
            )
            .bind(&spec.id)
            .bind(position as i32)
            .bind(&spec.name)
            .bind(spec.height)
            .bind(spec.width)
            .bind(spec.style.to_string())
            .bind(spec.z_index)
            .execute(&mut *tx)
            .await?;
        }
        let ids: Vec<String> = catalog.iter().map(|b| b.id.clone()).collect();
        sqlx::query("DELETE FROM buildings WHERE id <> ALL($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    /// All buildings in catalog order.
    pub async fn list_buildings(&self) -> Result<Vec<Building>, StoreError> {
        let rows = sqlx::query_as::<_, BuildingRow>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings ORDER BY position"
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Building::try_from).collect()
    }

    pub async fn get_building(&self, id: &str) -> Result<Option<Building>, StoreError> {
        let row = sqlx::query_as::<_, BuildingRow>(&format!(
            "SELECT {BUILDING_COLUMNS} FROM buildings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Building::try_from).transpose()
    }

    /// Light one random unlit building. `Exhausted` when none remain.
    pub async fn illuminate_any(
        &self,
        owner_name: &str,
        goal: &str,
    ) -> Result<Building, StoreError> {
        let row = sqlx::query_as::<_, BuildingRow>(&format!(
            "UPDATE buildings SET is_lit = TRUE, owner_name = $1, goal = $2, lit_at = $3
             WHERE id = (
               SELECT id FROM buildings WHERE NOT is_lit
               ORDER BY random() LIMIT 1
               FOR UPDATE SKIP LOCKED
             )
             RETURNING {BUILDING_COLUMNS}"
        ))
        .bind(owner_name)
        .bind(goal)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(row) => row.try_into(),
            None => Err(StoreError::Exhausted("No unlit buildings available")),
        }
    }

    /// Light a specific building. `NotFound` for unknown ids, `Conflict` if
    /// it is already lit.
    pub async fn illuminate_building(
        &self,
        id: &str,
        owner_name: &str,
        goal: &str,
    ) -> Result<Building, StoreError> {
        let row = sqlx::query_as::<_, BuildingRow>(&format!(
            "UPDATE buildings SET is_lit = TRUE, owner_name = $2, goal = $3, lit_at = $4
             WHERE id = $1 AND NOT is_lit
             RETURNING {BUILDING_COLUMNS}"
        ))
        .bind(id)
        .bind(owner_name)
        .bind(goal)
        .bind(now_millis())
        .fetch_optional(&self.pool)
        .await?;
        if let Some(row) = row {
            return row.try_into();
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM buildings WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Err(StoreError::Conflict(id.to_string()))
        } else {
            Err(StoreError::NotFound(id.to_string()))
        }
    }

    pub async fn reset_buildings(&self) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "UPDATE buildings SET is_lit = FALSE, owner_name = NULL, goal = NULL, lit_at = NULL
             WHERE is_lit",
        )
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// `(lit, total)` building counts.
    pub async fn count_buildings(&self) -> Result<(u64, u64), StoreError> {
        let (lit, total): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*) FILTER (WHERE is_lit), COUNT(*) FROM buildings",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok((lit.max(0) as u64, total.max(0) as u64))
    }
}
