//! Discrete tick marks for the range slider.
//!
//! One tick per calendar day of the interval. Ticks are generated in a
//! caller-supplied time zone so "calendar day" means the operator's day,
//! not the UTC one.

use chrono::{DateTime, Datelike, Days, Month, NaiveDate, TimeDelta, TimeZone};
use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::interval::TimeInterval;

/// Tick count at which per-day legends are dropped to avoid crowding.
pub const LEGEND_TICK_LIMIT: usize = 120;

/// Label rendered under a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Legend {
    /// First day of a month: day number plus full month name.
    MonthStart { day: String, month: String },
    /// Any other day: zero-padded day number.
    Day(String),
}

impl Legend {
    /// The lines of the legend, top to bottom.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Self::MonthStart { day, month } => vec![day.as_str(), month.as_str()],
            Self::Day(day) => vec![day.as_str()],
        }
    }
}

impl fmt::Display for Legend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MonthStart { day, month } => write!(f, "{day} \n {month}"),
            Self::Day(day) => write!(f, "{day}"),
        }
    }
}

/// One selectable step on the slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tick {
    /// Millisecond epoch timestamp.
    pub value: i64,
    /// Optional label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
}

/// Ordered tick marks for one interval.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TickSet {
    ticks: Vec<Tick>,
}

impl TickSet {
    /// Build one tick per day from `start` up to, but excluding, `end`.
    pub fn spanning<Tz: TimeZone>(start: DateTime<Tz>, end: &DateTime<Tz>) -> Self {
        let mut days = Vec::new();
        let mut cursor = Some(start);
        while let Some(day) = cursor {
            if day >= *end {
                break;
            }
            cursor = next_day(&day);
            days.push(day);
        }

        let dense = days.len() < LEGEND_TICK_LIMIT;
        let ticks = days
            .iter()
            .map(|day| Tick {
                value: day.timestamp_millis(),
                legend: legend_for(day, dense),
            })
            .collect();
        Self { ticks }
    }

    /// Replace the value of the tick on the same calendar day as `old`.
    ///
    /// The matched tick keeps its legend. Returns `false`, leaving the set
    /// untouched, when no tick shares that day.
    pub fn replace_value<Tz: TimeZone>(&mut self, old: i64, new: i64, tz: &Tz) -> bool {
        let Some(target) = local_day(tz, old) else {
            return false;
        };
        let Some(index) = self
            .ticks
            .iter()
            .position(|tick| local_day(tz, tick.value) == Some(target))
        else {
            debug!(old, new, "no tick on the requested day, replacement dropped");
            return false;
        };
        self.ticks[index].value = new;
        true
    }

    /// Index of the tick whose value is closest to `ms`.
    pub fn nearest_index(&self, ms: i64) -> Option<usize> {
        self.ticks
            .iter()
            .enumerate()
            .min_by_key(|(_, tick)| tick.value.abs_diff(ms))
            .map(|(index, _)| index)
    }

    pub fn get(&self, index: usize) -> Option<&Tick> {
        self.ticks.get(index)
    }

    pub fn first(&self) -> Option<&Tick> {
        self.ticks.first()
    }

    pub fn last(&self) -> Option<&Tick> {
        self.ticks.last()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tick> {
        self.ticks.iter()
    }

    pub fn as_slice(&self) -> &[Tick] {
        &self.ticks
    }

    /// All tick values in order.
    pub fn values(&self) -> Vec<i64> {
        self.ticks.iter().map(|tick| tick.value).collect()
    }
}

impl<'a> IntoIterator for &'a TickSet {
    type Item = &'a Tick;
    type IntoIter = std::slice::Iter<'a, Tick>;

    fn into_iter(self) -> Self::IntoIter {
        self.ticks.iter()
    }
}

/// Build the tick set for an interval.
///
/// The range runs through the end day inclusive (`end + 1 day`). A
/// zero-length interval is stretched by two days so the slider always has
/// two distinct steps for its handles.
pub fn build_ticks<Tz: TimeZone>(interval: &TimeInterval, tz: &Tz) -> TickSet {
    let (Some(start), Some(end)) = (
        at(tz, interval.start_ms()),
        at(tz, interval.end_ms()),
    ) else {
        return TickSet::default();
    };
    let extra = if interval.is_instant() { 2 } else { 1 };
    let end = end
        .clone()
        .checked_add_days(Days::new(extra))
        .unwrap_or(end);
    let ticks = TickSet::spanning(start, &end);
    debug!(
        start = interval.start_ms(),
        end = interval.end_ms(),
        count = ticks.len(),
        "built tick set"
    );
    ticks
}

/// Resolve a millisecond timestamp in the given zone.
pub(crate) fn at<Tz: TimeZone>(tz: &Tz, ms: i64) -> Option<DateTime<Tz>> {
    tz.timestamp_millis_opt(ms).single()
}

/// Calendar day of a timestamp in the given zone.
pub(crate) fn local_day<Tz: TimeZone>(tz: &Tz, ms: i64) -> Option<NaiveDate> {
    at(tz, ms).map(|dt| dt.date_naive())
}

fn next_day<Tz: TimeZone>(day: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    // A day step can land in a DST gap; fall back to 24 hours there.
    day.clone()
        .checked_add_days(Days::new(1))
        .or_else(|| day.clone().checked_add_signed(TimeDelta::days(1)))
}

fn legend_for<Tz: TimeZone>(day: &DateTime<Tz>, dense: bool) -> Option<Legend> {
    let day_number = format!("{:02}", day.day());
    if day.day() == 1 {
        let month = u8::try_from(day.month())
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map_or_else(String::new, |m| m.name().to_string());
        return Some(Legend::MonthStart {
            day: day_number,
            month,
        });
    }
    dense.then_some(Legend::Day(day_number))
}
