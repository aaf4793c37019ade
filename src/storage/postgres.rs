use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::{AggregateQuery, MeasurementStore};
use crate::models::{AggregateRow, NewMeasurement};
use crate::schema;

// ---

/// PostgreSQL-backed store over a shared connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close every pooled connection, waiting for checked-out ones.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MeasurementStore for PgStore {
    async fn migrate(&self) -> Result<()> {
        schema::create_schema(&self.pool).await
    }

    async fn insert(&self, m: &NewMeasurement) -> Result<()> {
        // ---
        sqlx::query(
            r#"
            INSERT INTO measurements.sensor_measurements (sensor_id, timestamp, type, value)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&m.sensor_id)
        .bind(m.timestamp.with_timezone(&Utc))
        .bind(&m.meas_type)
        .bind(m.value)
        .execute(&self.pool)
        .await
        .context("Failed to insert measurement")?;

        Ok(())
    }

    async fn aggregate(&self, q: &AggregateQuery<'_>) -> Result<Vec<AggregateRow>> {
        // ---
        debug!(
            sensor_id = q.sensor_id,
            meas_type = q.meas_type,
            interval = %q.interval,
            start = %q.window.start.text,
            stop = %q.window.stop.text,
            "Running aggregate query"
        );

        let rows = sqlx::query_as::<_, AggregateRow>(q.interval.aggregate_sql())
            .bind(q.sensor_id)
            .bind(q.meas_type)
            .bind(q.window.start.utc())
            .bind(q.window.stop.utc())
            .fetch_all(&self.pool)
            .await
            .context("Failed to run aggregate query")?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}
