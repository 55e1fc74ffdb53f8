//! Time ranges used to bound tag searches.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time range, either anchored at fixed instants or relative to an end instant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeRange {
    /// The last `past` before `end`; `end` defaults to the evaluation instant
    Relative {
        #[serde(with = "humantime_serde")]
        past: Duration,
        end: Option<DateTime<Utc>>,
    },
    Absolute {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Unix-second bounds of a resolved time range
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct UnixBounds {
    pub start: i64,
    pub end: i64,
}

impl TimeRange {
    /// A range covering the `past` duration up to now
    pub fn last(past: Duration) -> Self {
        Self::Relative { past, end: None }
    }

    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Relative { .. })
    }

    /// Resolve to absolute instants, using `now` as the end of open relative ranges
    pub fn to_absolute(&self, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
        match self {
            Self::Relative { past, end } => {
                let end = end.unwrap_or(now);
                let past = chrono::Duration::from_std(*past).unwrap_or(chrono::Duration::MAX);
                let start = end.checked_sub_signed(past).unwrap_or(DateTime::<Utc>::MIN_UTC);
                (start, end)
            }
            Self::Absolute { start, end } => (*start, *end),
        }
    }

    /// Unix-second bounds, rounded to the nearest second
    pub fn to_unix_bounds(&self, now: DateTime<Utc>) -> UnixBounds {
        let (start, end) = self.to_absolute(now);
        UnixBounds {
            start: round_to_seconds(start),
            end: round_to_seconds(end),
        }
    }
}

fn round_to_seconds(instant: DateTime<Utc>) -> i64 {
    let millis = instant.timestamp_millis();
    // half-up rounding, matching the rounding of fractional seconds in the query API
    (millis + 500).div_euclid(1000)
}
