//! Parsing and formatting for the date fields bound to the selector.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone};

use crate::ticks::at;

/// Date format accepted and shown by the picker fields.
pub const PICKER_FORMAT: &str = "%Y-%m-%d";

/// Separator between the two dates of a range field.
pub const RANGE_SEPARATOR: &str = "..";

/// Slider value label format, e.g. `03/01/2024, 2:05:09 PM`.
pub const SLIDER_LABEL_FORMAT: &str = "%d/%m/%Y, %-I:%M:%S %p";

/// Parse a picker date (`YYYY-MM-DD`) to local midnight in `tz`.
pub fn parse_picker_date<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<DateTime<Tz>, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }
    let date = NaiveDate::parse_from_str(trimmed, PICKER_FORMAT)
        .map_err(|_| InputError::InvalidDate(trimmed.to_string()))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| InputError::InvalidDate(trimmed.to_string()))?;
    start_of_day(tz, midnight)
        .ok_or_else(|| InputError::NonexistentLocalTime(trimmed.to_string()))
}

/// Step used to walk past a DST gap at midnight.
const GAP_STEP_MINUTES: i64 = 15;

/// Longest gap searched, in steps.
const GAP_STEPS: i64 = 4 * 24;

/// First valid local instant at or after `midnight`.
///
/// When midnight falls in a DST gap the day starts where the gap ends.
fn start_of_day<Tz: TimeZone>(tz: &Tz, midnight: NaiveDateTime) -> Option<DateTime<Tz>> {
    (0..=GAP_STEPS).find_map(|step| {
        let local = midnight.checked_add_signed(TimeDelta::minutes(step * GAP_STEP_MINUTES))?;
        tz.from_local_datetime(&local).earliest()
    })
}

/// Parse a range field (`YYYY-MM-DD..YYYY-MM-DD`).
///
/// The two dates may be given in either order; the result is ordered.
pub fn parse_picker_range<Tz: TimeZone>(
    input: &str,
    tz: &Tz,
) -> Result<(DateTime<Tz>, DateTime<Tz>), InputError> {
    let Some((left, right)) = input.split_once(RANGE_SEPARATOR) else {
        return Err(InputError::MissingSeparator(input.trim().to_string()));
    };
    let a = parse_picker_date(left, tz)?;
    let b = parse_picker_date(right, tz)?;
    Ok(if a <= b { (a, b) } else { (b, a) })
}

/// Format a timestamp for a picker field.
pub fn format_picker_date<Tz: TimeZone>(ms: i64, tz: &Tz) -> String {
    at(tz, ms).map_or_else(String::new, |dt| {
        dt.naive_local().format(PICKER_FORMAT).to_string()
    })
}

/// Format a range for the range field.
pub fn format_picker_range<Tz: TimeZone>(start_ms: i64, end_ms: i64, tz: &Tz) -> String {
    format!(
        "{}{RANGE_SEPARATOR}{}",
        format_picker_date(start_ms, tz),
        format_picker_date(end_ms, tz)
    )
}

/// Format a slider handle value.
pub fn format_slider_label<Tz: TimeZone>(ms: i64, tz: &Tz) -> String {
    at(tz, ms).map_or_else(String::new, |dt| {
        dt.naive_local().format(SLIDER_LABEL_FORMAT).to_string()
    })
}

/// Errors produced when parsing date fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    /// Field is blank.
    #[error("date is empty")]
    Empty,

    /// Text is not a `YYYY-MM-DD` date.
    #[error("invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Range has no `..` separator.
    #[error("invalid range `{0}`, expected YYYY-MM-DD..YYYY-MM-DD")]
    MissingSeparator(String),

    /// Local midnight does not exist on that date.
    #[error("no valid local time on {0}")]
    NonexistentLocalTime(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, Utc};

    #[test]
    fn test_parse_picker_date() {
        let dt = parse_picker_date(" 2024-02-29 ", &Utc).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap());

        assert_eq!(parse_picker_date("", &Utc), Err(InputError::Empty));
        assert_eq!(
            parse_picker_date("2023-02-29", &Utc),
            Err(InputError::InvalidDate("2023-02-29".into()))
        );
    }

    #[test]
    fn test_parse_picker_date_uses_local_midnight() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let dt = parse_picker_date("2024-01-01", &tz).unwrap();
        assert_eq!(
            dt.timestamp_millis(),
            Utc.with_ymd_and_hms(2023, 12, 31, 22, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
    }

    /// UTC-3 until local midnight of 2018-11-04, then UTC-2; that
    /// midnight hour is skipped.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch_utc() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2018, 11, 4)
                .unwrap()
                .and_hms_opt(3, 0, 0)
                .unwrap()
        }

        fn before() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(2 * 3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            match local.and_hms_opt(12, 0, 0) {
                Some(noon) => self.offset_from_local_datetime(&noon),
                None => LocalResult::None,
            }
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let gap_start = Self::switch_utc() - TimeDelta::hours(3);
            let gap_end = gap_start + TimeDelta::hours(1);
            if *local < gap_start {
                LocalResult::Single(Self::before())
            } else if *local >= gap_end {
                LocalResult::Single(Self::after())
            } else {
                LocalResult::None
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            match utc.and_hms_opt(0, 0, 0) {
                Some(midnight) => self.offset_from_utc_datetime(&midnight),
                None => Self::before(),
            }
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_utc() {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    #[test]
    fn test_parse_picker_date_skips_midnight_gap() {
        let dt = parse_picker_date("2018-11-04", &MidnightGap).unwrap();

        // Day starts at 01:00 local, the end of the gap
        assert_eq!(
            dt.timestamp_millis(),
            Utc.with_ymd_and_hms(2018, 11, 4, 3, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        assert_eq!(format_picker_date(dt.timestamp_millis(), &MidnightGap), "2018-11-04");

        // Neighbouring days still start at midnight
        let before = parse_picker_date("2018-11-03", &MidnightGap).unwrap();
        assert_eq!(
            before.timestamp_millis(),
            Utc.with_ymd_and_hms(2018, 11, 3, 3, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
        let (start, _) = parse_picker_range("2018-11-04..2018-11-05", &MidnightGap).unwrap();
        assert_eq!(start, dt);
    }

    #[test]
    fn test_parse_picker_range_orders_dates() {
        let (start, end) = parse_picker_range("2024-03-10..2024-03-01", &Utc).unwrap();
        assert!(start < end);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

        assert!(matches!(
            parse_picker_range("2024-03-10", &Utc),
            Err(InputError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_format_round_trips_through_fields() {
        let ms = Utc
            .with_ymd_and_hms(2024, 1, 3, 14, 5, 9)
            .unwrap()
            .timestamp_millis();
        assert_eq!(format_picker_date(ms, &Utc), "2024-01-03");
        assert_eq!(format_slider_label(ms, &Utc), "03/01/2024, 2:05:09 PM");
        assert_eq!(format_picker_range(ms, ms, &Utc), "2024-01-03..2024-01-03");
    }
}
