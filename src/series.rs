//! # Time-series value types.
//!
//! The storage/query engine is an external collaborator; these types are the
//! narrow contract the core exchanges with it:
//! - [`UtcPeriod`] a half-open `[start, end)` window;
//! - [`TimeSeries`] points sorted by time with unique timestamps;
//! - [`NamedSeries`] a series keyed by its destination identifier;
//! - [`TsInfo`] metadata returned by find queries.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time window `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtcPeriod {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl UtcPeriod {
    /// Creates a period from its bounds.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True if `t` falls inside the window.
    #[inline]
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        self.start <= t && t < self.end
    }

    /// Length of the window (zero if `end <= start`).
    pub fn duration(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or(Duration::ZERO)
    }
}

/// One sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Sample timestamp.
    pub time: DateTime<Utc>,
    /// Sample value.
    pub value: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

/// Points sorted by time; later duplicates of a timestamp win.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    points: Vec<Point>,
}

impl TimeSeries {
    /// Upper bound on the points produced by [`TimeSeries::constant`].
    pub const MAX_CONSTANT_POINTS: usize = 1 << 20;

    /// Builds a series from unordered points.
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        let map: BTreeMap<DateTime<Utc>, f64> =
            points.into_iter().map(|p| (p.time, p.value)).collect();
        Self::from_map(map)
    }

    /// Empty series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Constant-valued placeholder series covering `period` with one point every `dt`.
    ///
    /// Produces `ceil(period / dt)` points starting at `period.start`, capped at
    /// [`TimeSeries::MAX_CONSTANT_POINTS`]; a capped series covers only the head
    /// of the period. A zero `dt` or an empty period yields an empty series.
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use chrono::{TimeZone, Utc};
    /// use collectvisor::{TimeSeries, UtcPeriod};
    ///
    /// let start = Utc.timestamp_opt(0, 0).unwrap();
    /// let end = Utc.timestamp_opt(10, 0).unwrap();
    /// let ts = TimeSeries::constant(UtcPeriod::new(start, end), Duration::from_secs(3), 1.0);
    /// assert_eq!(ts.len(), 4);
    /// ```
    pub fn constant(period: UtcPeriod, dt: Duration, value: f64) -> Self {
        let Ok(step) = TimeDelta::from_std(dt) else {
            return Self::empty();
        };
        if step.is_zero() || period.end <= period.start {
            return Self::empty();
        }
        let count = period
            .duration()
            .as_nanos()
            .div_ceil(dt.as_nanos())
            .min(Self::MAX_CONSTANT_POINTS as u128);
        let count = usize::try_from(count).unwrap_or(Self::MAX_CONSTANT_POINTS);
        let points = (0..count)
            .map_while(|i| {
                let offset = step.checked_mul(i32::try_from(i).ok()?)?;
                period.start.checked_add_signed(offset)
            })
            .map(|time| Point::new(time, value));
        Self {
            points: points.collect(),
        }
    }

    fn from_map(map: BTreeMap<DateTime<Utc>, f64>) -> Self {
        Self {
            points: map
                .into_iter()
                .map(|(time, value)| Point { time, value })
                .collect(),
        }
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the series has no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sorted points.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Latest point, if any.
    pub fn latest(&self) -> Option<&Point> {
        self.points.last()
    }

    /// Points within `period`.
    pub fn slice(&self, period: UtcPeriod) -> Self {
        Self {
            points: self
                .points
                .iter()
                .filter(|p| period.contains(p.time))
                .copied()
                .collect(),
        }
    }

    /// Overlays `other` onto this series; `other` wins on equal timestamps.
    pub fn merge(&mut self, other: &TimeSeries) {
        let mut map: BTreeMap<DateTime<Utc>, f64> =
            self.points.iter().map(|p| (p.time, p.value)).collect();
        map.extend(other.points.iter().map(|p| (p.time, p.value)));
        *self = Self::from_map(map);
    }

    /// Time span covered by the points, if any.
    pub fn data_period(&self) -> Option<UtcPeriod> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some(UtcPeriod::new(first.time, last.time)),
            _ => None,
        }
    }
}

/// A series paired with the identifier it is stored under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedSeries {
    /// Destination identifier (`<scheme>://<path>` when routed).
    pub id: String,
    /// Series payload.
    pub series: TimeSeries,
}

impl NamedSeries {
    /// Pairs an identifier with a series.
    pub fn new(id: impl Into<String>, series: TimeSeries) -> Self {
        Self {
            id: id.into(),
            series,
        }
    }
}

/// Metadata describing a stored or available series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TsInfo {
    /// Series name/identifier.
    pub name: String,
    /// Covered time span, if known.
    pub data_period: Option<UtcPeriod>,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl TsInfo {
    /// Metadata stamped with the current time.
    pub fn now(name: impl Into<String>, data_period: Option<UtcPeriod>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            data_period,
            created: now,
            modified: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn constant_covers_period_with_ceil_points() {
        let ts = TimeSeries::constant(UtcPeriod::new(at(0), at(10)), Duration::from_secs(1), 2.5);
        assert_eq!(ts.len(), 10);
        assert_eq!(ts.points()[0], Point::new(at(0), 2.5));
        assert_eq!(ts.latest().unwrap().time, at(9));
    }

    #[test]
    fn constant_is_capped_for_huge_periods() {
        let whole_range = UtcPeriod::new(DateTime::<Utc>::MIN_UTC, at(0));
        let ts = TimeSeries::constant(whole_range, Duration::from_secs(3600), 1.0);
        assert_eq!(ts.len(), TimeSeries::MAX_CONSTANT_POINTS);
        assert_eq!(ts.points()[0].time, DateTime::<Utc>::MIN_UTC);

        let tiny_step = TimeSeries::constant(
            UtcPeriod::new(at(0), at(5)),
            Duration::from_nanos(1),
            1.0,
        );
        assert_eq!(tiny_step.len(), TimeSeries::MAX_CONSTANT_POINTS);
        assert!(tiny_step.latest().unwrap().time < at(5));
    }

    #[test]
    fn constant_with_zero_step_is_empty() {
        let ts = TimeSeries::constant(UtcPeriod::new(at(0), at(10)), Duration::ZERO, 1.0);
        assert!(ts.is_empty());
    }

    #[test]
    fn new_sorts_and_dedups() {
        let ts = TimeSeries::new([
            Point::new(at(5), 1.0),
            Point::new(at(1), 2.0),
            Point::new(at(5), 3.0),
        ]);
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.points()[0].time, at(1));
        assert_eq!(ts.points()[1].value, 3.0);
    }

    #[test]
    fn merge_extends_and_overrides() {
        let mut base = TimeSeries::new([Point::new(at(0), 1.0), Point::new(at(1), 1.0)]);
        let newer = TimeSeries::new([Point::new(at(1), 9.0), Point::new(at(2), 9.0)]);
        base.merge(&newer);
        let values: Vec<f64> = base.points().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![1.0, 9.0, 9.0]);
    }

    #[test]
    fn slice_is_half_open() {
        let ts = TimeSeries::constant(UtcPeriod::new(at(0), at(5)), Duration::from_secs(1), 0.0);
        let cut = ts.slice(UtcPeriod::new(at(1), at(3)));
        assert_eq!(cut.len(), 2);
        assert_eq!(cut.data_period(), Some(UtcPeriod::new(at(1), at(2))));
    }
}
