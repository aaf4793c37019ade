//! Aggregation interval selection.
//!
//! A caller picks the bucket width with the `aggregate` query parameter.
//! `"5min"` selects epoch-aligned 5-minute buckets; every other value,
//! including none at all, selects clock-hour buckets.

// Both templates bind: $1 sensor id, $2 type, $3 window start, $4 window stop.

const AGGREGATE_5MIN_SQL: &str = r#"
    SELECT to_timestamp(floor(extract(epoch FROM timestamp) / 300) * 300) AS bucket,
           MIN(value) AS min,
           AVG(value) AS mean,
           MAX(value) AS max
    FROM measurements.sensor_measurements
    WHERE sensor_id = $1 AND type = $2 AND timestamp BETWEEN $3 AND $4
    GROUP BY bucket
    ORDER BY bucket
"#;

const AGGREGATE_1H_SQL: &str = r#"
    SELECT date_trunc('hour', timestamp AT TIME ZONE 'UTC') AT TIME ZONE 'UTC' AS bucket,
           MIN(value) AS min,
           AVG(value) AS mean,
           MAX(value) AS max
    FROM measurements.sensor_measurements
    WHERE sensor_id = $1 AND type = $2 AND timestamp BETWEEN $3 AND $4
    GROUP BY bucket
    ORDER BY bucket
"#;

/// Bucket width used to aggregate readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    FiveMinutes,
    Hourly,
}

impl Interval {
    /// Map the optional `aggregate` token to an interval. Never fails.
    pub fn select(token: Option<&str>) -> Self {
        match token {
            Some("5min") => Interval::FiveMinutes,
            _ => Interval::Hourly,
        }
    }

    /// Name echoed back in the `interval` response field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::FiveMinutes => "5min",
            Interval::Hourly => "1h",
        }
    }

    /// Grouped aggregate query for this interval.
    pub fn aggregate_sql(&self) -> &'static str {
        match self {
            Interval::FiveMinutes => AGGREGATE_5MIN_SQL,
            Interval::Hourly => AGGREGATE_1H_SQL,
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
