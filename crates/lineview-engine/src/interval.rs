//! Time interval shared by every view of the time-range selector.

use chrono::{DateTime, Months, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A closed `(start, end)` pair of millisecond epoch timestamps.
///
/// Always satisfies `start_ms <= end_ms`. Intervals are replaced wholesale,
/// so there are no setters for individual bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    start_ms: i64,
    end_ms: i64,
}

impl TimeInterval {
    /// Create an interval, rejecting reversed or unrepresentable bounds.
    pub fn new(start_ms: i64, end_ms: i64) -> Result<Self, IntervalError> {
        if start_ms > end_ms {
            return Err(IntervalError::Reversed { start_ms, end_ms });
        }
        for ms in [start_ms, end_ms] {
            if DateTime::<Utc>::from_timestamp_millis(ms).is_none() {
                return Err(IntervalError::OutOfRange(ms));
            }
        }
        Ok(Self { start_ms, end_ms })
    }

    /// Create an interval from bounds in either order.
    ///
    /// Bounds outside chrono's range are clamped to it.
    pub fn ordered(a: i64, b: i64) -> Self {
        let a = clamp_representable(a);
        let b = clamp_representable(b);
        Self {
            start_ms: a.min(b),
            end_ms: a.max(b),
        }
    }

    /// The interval `(now, now + 1 calendar month)` in the given zone.
    pub fn month_from<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let end = now
            .clone()
            .checked_add_months(Months::new(1))
            .unwrap_or_else(|| now.clone());
        Self::ordered(now.timestamp_millis(), end.timestamp_millis())
    }

    pub fn start_ms(&self) -> i64 {
        self.start_ms
    }

    pub fn end_ms(&self) -> i64 {
        self.end_ms
    }

    /// Whether both bounds are the same instant.
    pub fn is_instant(&self) -> bool {
        self.start_ms == self.end_ms
    }

    /// Both bounds as a tuple.
    pub fn bounds(&self) -> (i64, i64) {
        (self.start_ms, self.end_ms)
    }

    /// Whether `ms` falls inside the closed interval.
    pub fn contains(&self, ms: i64) -> bool {
        (self.start_ms..=self.end_ms).contains(&ms)
    }
}

fn clamp_representable(ms: i64) -> i64 {
    let min = DateTime::<Utc>::MIN_UTC.timestamp_millis();
    let max = DateTime::<Utc>::MAX_UTC.timestamp_millis();
    ms.clamp(min, max)
}

/// Errors produced when constructing an interval.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// Start is after end.
    #[error("interval start {start_ms} is after end {end_ms}")]
    Reversed { start_ms: i64, end_ms: i64 },

    /// Timestamp cannot be represented as a calendar date.
    #[error("timestamp {0} is out of the supported date range")]
    OutOfRange(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_reversed_bounds() {
        let err = TimeInterval::new(10, 5).unwrap_err();
        assert_eq!(
            err,
            IntervalError::Reversed {
                start_ms: 10,
                end_ms: 5
            }
        );
    }

    #[test]
    fn test_new_rejects_unrepresentable_timestamps() {
        assert!(matches!(
            TimeInterval::new(0, i64::MAX),
            Err(IntervalError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_ordered_swaps_bounds() {
        let interval = TimeInterval::ordered(2_000, 1_000);
        assert_eq!(interval.bounds(), (1_000, 2_000));
        assert!(interval.contains(1_500));
        assert!(!interval.contains(2_001));
    }

    #[test]
    fn test_month_from_spans_one_calendar_month() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let interval = TimeInterval::month_from(&now);
        let end = Utc.timestamp_millis_opt(interval.end_ms()).unwrap();
        // chrono clamps to the last day of a shorter month
        assert_eq!(end, Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap());
        assert!(!interval.is_instant());
    }
}
