//! Query time-window resolution.
//!
//! A caller may send neither, one, or both of `timeFrameStart` and
//! `timeFrameStop`. [`TimeWindow::resolve`] fills the gaps (stop defaults to
//! now, start to 24 hours before stop) and orders the pair ascending. The
//! text form of each bound is kept verbatim for echoing in the response.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, TimeDelta, Timelike, Utc};
use thiserror::Error;

/// Length of the default window when no start is given.
const DEFAULT_SPAN_HOURS: i64 = 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid time frame value '{0}', expected an ISO-8601 instant")]
    InvalidInstant(String),
}

/// One end of a resolved window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    /// Representation as supplied by the caller or produced by defaulting.
    pub text: String,
    /// Parsed instant.
    pub at: DateTime<FixedOffset>,
}

impl Bound {
    fn parse(text: &str) -> Result<Self, WindowError> {
        Ok(Bound {
            text: text.to_string(),
            at: parse_instant(text)?,
        })
    }

    fn from_instant(at: DateTime<FixedOffset>) -> Self {
        Bound {
            text: at.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            at,
        }
    }

    pub fn utc(&self) -> DateTime<Utc> {
        self.at.with_timezone(&Utc)
    }
}

/// A resolved `[start, stop]` window with `start <= stop`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Bound,
    pub stop: Bound,
}

impl TimeWindow {
    /// Resolve against the current wall clock.
    pub fn resolve(start: Option<&str>, stop: Option<&str>) -> Result<Self, WindowError> {
        Self::resolve_at(start, stop, Utc::now())
    }

    /// Resolve with an explicit `now`, used when stop is absent.
    pub fn resolve_at(
        start: Option<&str>,
        stop: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, WindowError> {
        // ---
        let stop = match stop {
            Some(text) => Bound::parse(text)?,
            None => {
                let now = now.with_nanosecond(0).unwrap_or(now);
                Bound::from_instant(now.fixed_offset())
            }
        };

        let start = match start {
            Some(text) => Bound::parse(text)?,
            None => Bound::from_instant(stop.at - TimeDelta::hours(DEFAULT_SPAN_HOURS)),
        };

        if start.at > stop.at {
            return Ok(TimeWindow {
                start: stop,
                stop: start,
            });
        }
        Ok(TimeWindow { start, stop })
    }
}

/// Parse an ISO-8601 instant the way a `TIMESTAMPTZ` column accepts it.
///
/// RFC 3339 is tried first; then `T` or space separated forms with an offset
/// of `+hh`, `+hhmm` or `+hh:mm`. A date-time without an offset is taken as UTC.
pub fn parse_instant(text: &str) -> Result<DateTime<FixedOffset>, WindowError> {
    // ---
    let trimmed = text.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(at);
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%#z", "%Y-%m-%d %H:%M:%S%.f%#z"] {
        if let Ok(at) = DateTime::parse_from_str(trimmed, fmt) {
            return Ok(at);
        }
    }
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc().fixed_offset())
        .map_err(|_| WindowError::InvalidInstant(text.to_string()))
}
