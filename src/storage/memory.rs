use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, DurationRound, TimeDelta, Utc};

use super::{AggregateQuery, MeasurementStore};
use crate::interval::Interval;
use crate::models::{AggregateRow, NewMeasurement};

/// Width of a 5-minute bucket in seconds.
const FIVE_MINUTES_SECS: i64 = 300;

// ---

/// Start of the bucket `ts` falls into, matching the SQL grouping expression.
fn bucket_start(interval: Interval, ts: DateTime<Utc>) -> DateTime<Utc> {
    match interval {
        Interval::FiveMinutes => {
            let secs = ts.timestamp().div_euclid(FIVE_MINUTES_SECS) * FIVE_MINUTES_SECS;
            DateTime::from_timestamp(secs, 0).unwrap_or(ts)
        }
        Interval::Hourly => ts.duration_trunc(TimeDelta::hours(1)).unwrap_or(ts),
    }
}

/// In-memory store with the same aggregation semantics as the SQL queries.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<NewMeasurement>>,
    calls: Mutex<usize>,
    offline: bool,
}

impl MemoryStore {
    /// A store whose every call fails, standing in for a lost database.
    pub fn offline() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Number of storage calls made so far, migrations excluded.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    pub fn stored(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn touch(&self) -> Result<()> {
        *self.calls.lock().unwrap() += 1;
        if self.offline {
            return Err(anyhow!("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl MeasurementStore for MemoryStore {
    async fn migrate(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, measurement: &NewMeasurement) -> Result<()> {
        self.touch()?;
        self.rows.lock().unwrap().push(measurement.clone());
        Ok(())
    }

    async fn aggregate(&self, q: &AggregateQuery<'_>) -> Result<Vec<AggregateRow>> {
        // ---
        self.touch()?;
        let start = q.window.start.utc();
        let stop = q.window.stop.utc();

        let mut buckets: BTreeMap<DateTime<Utc>, Vec<f64>> = BTreeMap::new();
        for m in self.rows.lock().unwrap().iter() {
            let ts = m.timestamp.with_timezone(&Utc);
            if m.sensor_id != q.sensor_id || m.meas_type != q.meas_type {
                continue;
            }
            if ts < start || ts > stop {
                continue;
            }
            buckets
                .entry(bucket_start(q.interval, ts))
                .or_default()
                .push(m.value);
        }

        Ok(buckets
            .into_iter()
            .map(|(bucket, values)| AggregateRow {
                bucket,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                mean: values.iter().sum::<f64>() / values.len() as f64,
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.touch()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::window::TimeWindow;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, m, s).unwrap()
    }

    fn reading(sensor: &str, kind: &str, ts: &str, value: f64) -> NewMeasurement {
        NewMeasurement {
            sensor_id: sensor.into(),
            timestamp: DateTime::parse_from_rfc3339(ts).unwrap(),
            meas_type: kind.into(),
            value,
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::default();
        for m in [
            reading("s1", "temp", "2024-01-01T00:00:00Z", 20.0),
            reading("s1", "temp", "2024-01-01T00:03:00Z", 22.0),
            reading("s1", "temp", "2024-01-01T00:07:00Z", 18.0),
            reading("s1", "temp", "2024-01-01T01:10:00Z", 30.0),
            reading("s1", "humidity", "2024-01-01T00:01:00Z", 55.0),
            reading("s2", "temp", "2024-01-01T00:02:00Z", 99.0),
        ] {
            store.insert(&m).await.unwrap();
        }
        store
    }

    fn window(start: &str, stop: &str) -> TimeWindow {
        TimeWindow::resolve(Some(start), Some(stop)).unwrap()
    }

    #[test]
    fn test_five_minute_buckets_floor_to_epoch_multiples() {
        // ---
        let five = Interval::FiveMinutes;
        assert_eq!(bucket_start(five, at(0, 0, 0)), at(0, 0, 0));
        assert_eq!(bucket_start(five, at(0, 3, 0)), at(0, 0, 0));
        assert_eq!(bucket_start(five, at(0, 4, 59)), at(0, 0, 0));
        assert_eq!(bucket_start(five, at(0, 5, 0)), at(0, 5, 0));
        assert_eq!(bucket_start(five, at(13, 57, 12)), at(13, 55, 0));
    }

    #[test]
    fn test_hourly_buckets_truncate_to_hour() {
        // ---
        let hourly = Interval::Hourly;
        assert_eq!(bucket_start(hourly, at(0, 59, 59)), at(0, 0, 0));
        assert_eq!(bucket_start(hourly, at(7, 0, 0)), at(7, 0, 0));
        assert_eq!(bucket_start(hourly, at(23, 30, 1)), at(23, 0, 0));
    }

    #[tokio::test]
    async fn test_five_minute_aggregation() {
        // ---
        let store = seeded().await;
        let w = window("2024-01-01T00:00:00Z", "2024-01-01T01:00:00Z");
        let rows = store
            .aggregate(&AggregateQuery {
                sensor_id: "s1",
                meas_type: "temp",
                interval: Interval::FiveMinutes,
                window: &w,
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bucket, at(0, 0, 0));
        assert_eq!((rows[0].min, rows[0].mean, rows[0].max), (20.0, 21.0, 22.0));
        assert_eq!(rows[1].bucket, at(0, 5, 0));
        assert_eq!((rows[1].min, rows[1].mean, rows[1].max), (18.0, 18.0, 18.0));
    }

    #[tokio::test]
    async fn test_hourly_aggregation_is_ascending() {
        // ---
        let store = seeded().await;
        let w = window("2024-01-01T00:00:00Z", "2024-01-01T02:00:00Z");
        let rows = store
            .aggregate(&AggregateQuery {
                sensor_id: "s1",
                meas_type: "temp",
                interval: Interval::Hourly,
                window: &w,
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.windows(2).all(|pair| pair[0].bucket <= pair[1].bucket));
        assert_eq!((rows[0].min, rows[0].mean, rows[0].max), (18.0, 20.0, 22.0));
        assert_eq!((rows[1].min, rows[1].mean, rows[1].max), (30.0, 30.0, 30.0));
    }

    #[tokio::test]
    async fn test_window_bounds_are_inclusive() {
        // ---
        let store = seeded().await;
        let w = window("2024-01-01T00:03:00Z", "2024-01-01T00:07:00Z");
        let rows = store
            .aggregate(&AggregateQuery {
                sensor_id: "s1",
                meas_type: "temp",
                interval: Interval::Hourly,
                window: &w,
            })
            .await
            .unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].min, rows[0].max), (18.0, 22.0));
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        // ---
        let store = MemoryStore::offline();
        assert!(store.ping().await.is_err());
        assert_eq!(store.calls(), 1);
    }
}
