//! Window light operations.
//!
//! Upserts run inside a transaction holding a transaction-scoped advisory
//! lock, so the capacity check, the timestamp choice and the write are one
//! atomic step even with several service replicas behind a load balancer.

use super::Database;
use crate::model::{next_timestamp, Light, LightDraft, WindowId};
use crate::store::StoreError;
use chrono::{DateTime, Utc};

/// Advisory lock key serializing light writes ("SKYLIGHT" in ASCII).
const LIGHTS_LOCK_KEY: i64 = 0x534b_594c_4947_4854;

#[derive(sqlx::FromRow)]
struct LightRow {
    window_key: String,
    window_numeric: bool,
    name: String,
    goal: String,
    color: String,
    lit_at: DateTime<Utc>,
}

impl From<LightRow> for Light {
    fn from(row: LightRow) -> Self {
        Light {
            window_id: WindowId::from_storage(row.window_key, row.window_numeric),
            name: row.name,
            goal: row.goal,
            color: row.color,
            timestamp: row.lit_at,
        }
    }
}

impl Database {
    /// Insert or overwrite a light. New windows are rejected once
    /// `total_windows` lights exist; overwrites always succeed.
    pub async fn upsert_light(
        &self,
        draft: LightDraft,
        total_windows: u32,
    ) -> Result<Light, StoreError> {
        let key = draft.window_id.storage_key();
        let mut tx = self.pool.begin().await?;
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(LIGHTS_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let (count, exists, last): (i64, bool, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(BOOL_OR(window_key = $1), FALSE), MAX(lit_at)
             FROM lights",
        )
        .bind(&key)
        .fetch_one(&mut *tx)
        .await?;

        if !exists && count >= i64::from(total_windows) {
            // Dropping the transaction rolls it back and releases the lock
            return Err(StoreError::Exhausted("All windows are already lit"));
        }

        let row = sqlx::query_as::<_, LightRow>(
            "INSERT INTO lights (window_key, window_numeric, name, goal, color, lit_at, seq)
             VALUES ($1, $2, $3, $4, $5, $6, nextval('lights_seq'))
             ON CONFLICT (window_key) DO UPDATE SET
               window_numeric = EXCLUDED.window_numeric,
               name = EXCLUDED.name,
               goal = EXCLUDED.goal,
               color = EXCLUDED.color,
               lit_at = EXCLUDED.lit_at,
               seq = EXCLUDED.seq
             RETURNING window_key, window_numeric, name, goal, color, lit_at",
        )
        .bind(&key)
        .bind(draft.window_id.is_numeric())
        .bind(&draft.name)
        .bind(&draft.goal)
        .bind(&draft.color)
        .bind(next_timestamp(last))
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into())
    }

    pub async fn get_light(&self, id: &WindowId) -> Result<Option<Light>, StoreError> {
        let row = sqlx::query_as::<_, LightRow>(
            "SELECT window_key, window_numeric, name, goal, color, lit_at
             FROM lights WHERE window_key = $1 AND window_numeric = $2",
        )
        .bind(id.storage_key())
        .bind(id.is_numeric())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Light::from))
    }

    /// All lights, oldest first, ties broken by write order.
    pub async fn list_lights(&self) -> Result<Vec<Light>, StoreError> {
        let rows = sqlx::query_as::<_, LightRow>(
            "SELECT window_key, window_numeric, name, goal, color, lit_at
             FROM lights ORDER BY lit_at ASC, seq ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Light::from).collect())
    }

    pub async fn count_lights(&self) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lights")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn reset_lights(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM lights").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
