//! Time Normalizer -- wall-clock start + duration into a canonical interval.
//!
//! All arithmetic happens on `NaiveDateTime`, i.e. in the frame the instant was
//! supplied in. Nothing here consults a timezone: an instant is never read as UTC
//! and re-localized, so the displayed time cannot drift by the local UTC offset.
//!
//! The canonical textual form is `YYYY-MM-DDTHH:MM:SS` with a fractional-second
//! suffix only when the fraction is non-zero. It carries no zone designator and
//! sorts lexicographically in chronological order.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta, Timelike};

use crate::error::{Result, ScheduleError};
use crate::model::Interval;

/// `chrono` format used for persisted and compared timestamps.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Minute-precision form produced by `datetime-local` inputs.
const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Wall-clock layouts accepted on input. `%.f` also matches an absent fraction.
const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a wall-clock string into a local date/time.
///
/// Accepts `2024-01-01T10:15`, `2024-01-01T10:15:00`, `2024-01-01T10:15:00.250`
/// and the same forms with a space instead of `T`.
///
/// # Errors
/// Returns `ScheduleError::InvalidInstant` if the string matches none of the
/// accepted layouts, or if it carries a zone designator (`Z`, `+02:00`). Zoned
/// input is refused rather than converted, since conversion would shift it.
pub fn parse_wall_clock(input: &str) -> Result<NaiveDateTime> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::InvalidInstant("empty timestamp".to_string()));
    }

    for format in ACCEPTED_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }

    if DateTime::parse_from_rfc3339(trimmed).is_ok() {
        return Err(ScheduleError::InvalidInstant(format!(
            "'{}' carries a zone designator; expected a wall-clock time",
            trimmed
        )));
    }

    Err(ScheduleError::InvalidInstant(format!(
        "'{}' is not a date and time (expected YYYY-MM-DDTHH:MM[:SS])",
        trimmed
    )))
}

/// Format an instant in the canonical, sortable form.
pub fn format_canonical(instant: &NaiveDateTime) -> String {
    instant.format(CANONICAL_FORMAT).to_string()
}

/// Format an instant for display, dropping seconds when they are zero.
///
/// A minute-precision input comes back exactly as it was typed.
pub fn format_display(instant: &NaiveDateTime) -> String {
    if instant.second() == 0 && instant.nanosecond() == 0 {
        instant.format(MINUTE_FORMAT).to_string()
    } else {
        format_canonical(instant)
    }
}

/// Validate a duration in minutes and convert it to a `TimeDelta`.
///
/// Any positive integer is accepted. Preset lists such as 15/30/45/60/90/120
/// are a form convenience, not a constraint.
pub fn duration_from_minutes(minutes: i64) -> Result<TimeDelta> {
    if minutes <= 0 {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} minutes; duration must be a positive number of minutes",
            minutes
        )));
    }
    TimeDelta::try_minutes(minutes).ok_or_else(|| {
        ScheduleError::InvalidDuration(format!("{} minutes is out of range", minutes))
    })
}

/// Convert a floating-point minute count into whole minutes.
///
/// # Errors
/// Returns `ScheduleError::InvalidDuration` for NaN, infinities, fractional
/// values, and anything not strictly positive.
pub fn minutes_from_f64(minutes: f64) -> Result<i64> {
    if !minutes.is_finite() {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} is not a finite number of minutes",
            minutes
        )));
    }
    if minutes.fract() != 0.0 {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} is not a whole number of minutes",
            minutes
        )));
    }
    if minutes <= 0.0 {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} minutes; duration must be a positive number of minutes",
            minutes
        )));
    }
    if minutes >= i64::MAX as f64 {
        return Err(ScheduleError::InvalidDuration(format!(
            "{} minutes is out of range",
            minutes
        )));
    }
    Ok(minutes as i64)
}

/// Parse a textual minute count such as `"30"` or `"45.0"`.
pub fn minutes_from_str(input: &str) -> Result<i64> {
    let trimmed = input.trim();
    if let Ok(whole) = trimmed.parse::<i64>() {
        return Ok(whole);
    }
    let value: f64 = trimmed.parse().map_err(|_| {
        ScheduleError::InvalidDuration(format!("'{}' is not a number of minutes", trimmed))
    })?;
    minutes_from_f64(value)
}

/// Derive the canonical interval for a wall-clock start and a duration.
///
/// `end = start + duration_minutes`, computed in the same local frame.
///
/// # Errors
/// Returns `ScheduleError::InvalidDuration` if `duration_minutes <= 0` or the end
/// falls outside the representable calendar. Returns
/// `ScheduleError::InvalidInstant` if `local_start` cannot be parsed.
pub fn normalize(local_start: &str, duration_minutes: i64) -> Result<Interval> {
    let duration = duration_from_minutes(duration_minutes)?;
    let start = parse_wall_clock(local_start)?;
    interval_from(start, duration)
}

fn interval_from(start: NaiveDateTime, duration: TimeDelta) -> Result<Interval> {
    let end = start.checked_add_signed(duration).ok_or_else(|| {
        ScheduleError::InvalidDuration(format!(
            "{} minutes after {} is past the end of the calendar",
            duration.num_minutes(),
            format_canonical(&start)
        ))
    })?;
    Interval::new(start, end)
}

/// Display strings for an interval, in the frame the user entered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSpan {
    pub start: String,
    pub end: String,
}

impl fmt::Display for LocalSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Same-day spans print the end time only: "2024-01-01T10:00 - 10:30".
        match (self.start.split_once('T'), self.end.split_once('T')) {
            (Some((start_date, _)), Some((end_date, end_time))) if start_date == end_date => {
                write!(f, "{} - {}", self.start, end_time)
            }
            _ => write!(f, "{} - {}", self.start, self.end),
        }
    }
}

/// Inverse of [`normalize`] for presentation. Not used by conflict logic.
pub fn denormalize(interval: &Interval) -> LocalSpan {
    LocalSpan {
        start: format_display(&interval.start()),
        end: format_display(&interval.end()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_omits_zero_fraction() {
        let t = parse_wall_clock("2024-01-01T10:15").unwrap();
        assert_eq!(format_canonical(&t), "2024-01-01T10:15:00");
    }

    #[test]
    fn canonical_form_keeps_nonzero_fraction() {
        let t = parse_wall_clock("2024-01-01T10:15:00.250").unwrap();
        assert_eq!(format_canonical(&t), "2024-01-01T10:15:00.250");
    }

    #[test]
    fn display_drops_zero_seconds() {
        let t = parse_wall_clock("2024-01-01 09:05:00").unwrap();
        assert_eq!(format_display(&t), "2024-01-01T09:05");
    }

    #[test]
    fn float_minutes_must_be_whole_and_positive() {
        assert_eq!(minutes_from_f64(45.0).unwrap(), 45);
        assert!(minutes_from_f64(0.5).is_err());
        assert!(minutes_from_f64(-30.0).is_err());
        assert!(minutes_from_f64(f64::NAN).is_err());
        assert!(minutes_from_f64(f64::INFINITY).is_err());
    }

    #[test]
    fn span_display_shortens_same_day_end() {
        let span = LocalSpan {
            start: "2024-01-01T10:00".into(),
            end: "2024-01-01T10:30".into(),
        };
        assert_eq!(span.to_string(), "2024-01-01T10:00 - 10:30");
    }
}
