//! Data models for measurement ingest and aggregate responses.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::window::parse_instant;

// ---

/// A single sensor reading as posted by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeasurement {
    // ---
    pub sensor_id: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(rename = "type")]
    pub meas_type: String,
    pub value: f64,
}

/// Reading timestamps follow the same rule as query window bounds, so any
/// text a reading was stored with can also be used to query it.
fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_instant(&text).map_err(serde::de::Error::custom)
}

/// One aggregate row as returned by storage, before rounding.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AggregateRow {
    // ---
    pub bucket: DateTime<Utc>,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// One bucket of the `aggregatedData` response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    // ---
    pub timestamp: DateTime<Utc>,
    pub min: f64,
    pub mean: f64,
    pub max: f64,
}

/// Round to 2 decimal places, half away from zero.
///
/// Operates on the binary value, so `1.005` (stored as `1.00499…`) becomes
/// `1.0` while `1.125` becomes `1.13`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<AggregateRow> for AggregateBucket {
    fn from(row: AggregateRow) -> Self {
        AggregateBucket {
            timestamp: row.bucket,
            min: round2(row.min),
            mean: round2(row.mean),
            max: round2(row.max),
        }
    }
}

/// Shape raw storage rows into response buckets, keeping their order.
pub fn shape_aggregates(rows: Vec<AggregateRow>) -> Vec<AggregateBucket> {
    rows.into_iter().map(AggregateBucket::from).collect()
}
