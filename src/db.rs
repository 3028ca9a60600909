use anyhow::Context;
use chrono::NaiveDateTime;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::models::{SavedRecord, Target};
use crate::store::{RecordStore, StoreError};

const LOCATION: &str = "attendance_tracker.last_record";

/// Postgres-backed store holding the last record in a single-row table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn corrupt(detail: impl Into<String>) -> StoreError {
    StoreError::Corrupt {
        location: LOCATION.to_string(),
        detail: detail.into(),
    }
}

fn count_from_column(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| corrupt(format!("{column} out of range: {value}")))
}

impl RecordStore for PgStore {
    async fn load(&self) -> Result<Option<SavedRecord>, StoreError> {
        let row = sqlx::query(
            "SELECT total, attended, target, last_updated \
             FROM attendance_tracker.last_record WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let total = count_from_column(row.try_get("total")?, "total")?;
        let attended = count_from_column(row.try_get("attended")?, "attended")?;
        let target: i16 = row.try_get("target")?;
        let target = Target::new(i64::from(target)).map_err(|err| corrupt(err.to_string()))?;
        let last_updated: NaiveDateTime = row.try_get("last_updated")?;

        Ok(Some(SavedRecord {
            total,
            attended,
            target,
            last_updated,
        }))
    }

    async fn save(&self, saved: &SavedRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO attendance_tracker.last_record (id, total, attended, target, last_updated)
            VALUES (1, $1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
            SET total = EXCLUDED.total,
                attended = EXCLUDED.attended,
                target = EXCLUDED.target,
                last_updated = EXCLUDED.last_updated
            "#,
        )
        .bind(i64::from(saved.total))
        .bind(i64::from(saved.attended))
        .bind(i16::from(saved.target.value()))
        .bind(saved.last_updated)
        .execute(&self.pool)
        .await?;

        tracing::debug!("saved attendance record to Postgres");
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM attendance_tracker.last_record")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
