//! Storage handle shared by the HTTP handlers.
//!
//! Handlers only see [`MeasurementStore`]; the process wires in [`PgStore`]
//! at startup, tests wire in an in-memory store.

use anyhow::Result;
use async_trait::async_trait;

use crate::interval::Interval;
use crate::models::{AggregateRow, NewMeasurement};
use crate::window::TimeWindow;

#[cfg(test)]
mod memory;
mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

// ---

/// Parameters of one aggregate lookup.
#[derive(Debug, Clone)]
pub struct AggregateQuery<'a> {
    pub sensor_id: &'a str,
    pub meas_type: &'a str,
    pub interval: Interval,
    pub window: &'a TimeWindow,
}

#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Create schema objects if missing. Safe to run repeatedly.
    async fn migrate(&self) -> Result<()>;

    /// Append one reading.
    async fn insert(&self, measurement: &NewMeasurement) -> Result<()>;

    /// Min/mean/max per bucket for readings matching sensor id and type
    /// inside the window (both ends inclusive), ascending by bucket.
    async fn aggregate(&self, query: &AggregateQuery<'_>) -> Result<Vec<AggregateRow>>;

    /// Cheap liveness check.
    async fn ping(&self) -> Result<()>;
}
