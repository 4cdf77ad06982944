//! # Collection periods.
//!
//! A [`CollectionPeriod`] yields the read window of a collection cycle and
//! the wait between cycles.
//!
//! ```text
//! Relative { start_offset: 2h, end_offset: 10m }   →  [now - 2h, now - 10m)   (recomputed per call)
//! Absolute { start, end }                          →  [start, end)            (fixed)
//! ```

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::series::UtcPeriod;

/// Read window and cadence of a collection task.
///
/// Deserializes from a tagged map with humantime durations:
/// `{ "kind": "relative", "start_offset": "2h", "end_offset": "10m", "wait_time": "10m" }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CollectionPeriod {
    /// Window relative to the time of the read.
    Relative {
        /// How far back the window starts.
        #[serde(with = "humantime_serde")]
        start_offset: Duration,
        /// How far back the window ends (default: now).
        #[serde(default, with = "humantime_serde")]
        end_offset: Duration,
        /// Time between cycles.
        #[serde(with = "humantime_serde")]
        wait_time: Duration,
    },
    /// Fixed window.
    Absolute {
        /// Inclusive start.
        start: DateTime<Utc>,
        /// Exclusive end.
        end: DateTime<Utc>,
        /// Time between cycles.
        #[serde(with = "humantime_serde")]
        wait_time: Duration,
    },
}

impl CollectionPeriod {
    /// Relative window `[now - start_offset, now - end_offset)`.
    pub fn relative(start_offset: Duration, end_offset: Duration, wait_time: Duration) -> Self {
        Self::Relative {
            start_offset,
            end_offset,
            wait_time,
        }
    }

    /// Fixed window `[start, end)`.
    pub fn absolute(start: DateTime<Utc>, end: DateTime<Utc>, wait_time: Duration) -> Self {
        Self::Absolute {
            start,
            end,
            wait_time,
        }
    }

    /// Window to read now.
    pub fn period(&self) -> UtcPeriod {
        match self {
            Self::Relative {
                start_offset,
                end_offset,
                ..
            } => {
                let now = Utc::now();
                UtcPeriod::new(back(now, *start_offset), back(now, *end_offset))
            }
            Self::Absolute { start, end, .. } => UtcPeriod::new(*start, *end),
        }
    }

    /// Time between cycles.
    pub fn wait_time(&self) -> Duration {
        match self {
            Self::Relative { wait_time, .. } | Self::Absolute { wait_time, .. } => *wait_time,
        }
    }
}

fn back(now: DateTime<Utc>, offset: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(offset)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn relative_window_trails_now() {
        let p = CollectionPeriod::relative(
            Duration::from_secs(7200),
            Duration::from_secs(600),
            Duration::from_millis(500),
        );
        let before = Utc::now();
        let w = p.period();
        let after = Utc::now();

        assert_eq!(w.duration(), Duration::from_secs(6600));
        assert!(w.end >= before - TimeDelta::seconds(600));
        assert!(w.end <= after - TimeDelta::seconds(600));
        assert_eq!(p.wait_time(), Duration::from_millis(500));
    }

    #[test]
    fn absolute_window_is_fixed() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let p = CollectionPeriod::absolute(start, end, Duration::from_secs(60));
        assert_eq!(p.period(), UtcPeriod::new(start, end));
        assert_eq!(p.period(), p.period());
    }

    #[test]
    fn end_offset_defaults_to_now() {
        let p: CollectionPeriod = serde_json::from_str(
            r#"{ "kind": "relative", "start_offset": "1h", "wait_time": "1m" }"#,
        )
        .unwrap();
        assert_eq!(
            p,
            CollectionPeriod::relative(Duration::from_secs(3600), Duration::ZERO, Duration::from_secs(60))
        );
    }

    #[test]
    fn deserializes_relative() {
        let p: CollectionPeriod = serde_json::from_str(
            r#"{ "kind": "relative", "start_offset": "2h", "end_offset": "10m", "wait_time": "10m" }"#,
        )
        .unwrap();
        assert_eq!(
            p,
            CollectionPeriod::relative(
                Duration::from_secs(7200),
                Duration::from_secs(600),
                Duration::from_secs(600)
            )
        );
    }
}
