//! Database schema management for `sensorflow-aggregates`.
//!
//! Ensures the measurements table and its lookup index exist before serving
//! requests. Applied once on startup through the store's `migrate`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the measurement schema (idempotent).
///
/// The table is append-only: one row per reading, no uniqueness constraint,
/// every column NOT NULL. Safe to call on every startup.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query("CREATE SCHEMA IF NOT EXISTS measurements")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS measurements.sensor_measurements (
            sensor_id  TEXT             NOT NULL,
            timestamp  TIMESTAMPTZ      NOT NULL,
            type       TEXT             NOT NULL,
            value      DOUBLE PRECISION NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Every aggregate query filters on sensor, type and a time range
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_sensor_measurements_lookup
            ON measurements.sensor_measurements (sensor_id, type, timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}
