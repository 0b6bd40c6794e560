//! Scheduling data model: intervals, persisted events, and transient proposals.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::time;

// ---------------------------------------------------------------------------
// Interval
// ---------------------------------------------------------------------------

/// A half-open wall-clock range `[start, end)` with `start < end`.
///
/// Serializes as `{"start": "...", "end": "..."}` in the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "IntervalRepr", into = "IntervalRepr")]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// # Errors
    /// Returns `ScheduleError::InvalidDuration` unless `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start >= end {
            return Err(ScheduleError::InvalidDuration(format!(
                "interval ending at {} does not start before it ends",
                time::format_canonical(&end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse both endpoints from wall-clock strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(time::parse_wall_clock(start)?, time::parse_wall_clock(end)?)
    }

    /// Inclusive.
    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive.
    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// `true` iff the two ranges share at least one instant.
    ///
    /// `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && s2 < e1`, so ranges
    /// that merely touch (one ends exactly when the other starts) do not.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whole minutes shared with `other`, or `None` when they do not overlap.
    pub fn overlap_minutes(&self, other: &Interval) -> Option<i64> {
        if !self.overlaps(other) {
            return None;
        }
        let overlap_start = self.start.max(other.start);
        let overlap_end = self.end.min(other.end);
        Some((overlap_end - overlap_start).num_minutes())
    }

    pub fn start_canonical(&self) -> String {
        time::format_canonical(&self.start)
    }

    pub fn end_canonical(&self) -> String {
        time::format_canonical(&self.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start_canonical(), self.end_canonical())
    }
}

#[derive(Serialize, Deserialize)]
struct IntervalRepr {
    start: String,
    end: String,
}

impl TryFrom<IntervalRepr> for Interval {
    type Error = ScheduleError;

    fn try_from(repr: IntervalRepr) -> Result<Self> {
        Interval::parse(&repr.start, &repr.end)
    }
}

impl From<Interval> for IntervalRepr {
    fn from(interval: Interval) -> Self {
        Self {
            start: interval.start_canonical(),
            end: interval.end_canonical(),
        }
    }
}

// ---------------------------------------------------------------------------
// Weekdays
// ---------------------------------------------------------------------------

/// A weekday label as used in recurring-day tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

impl From<chrono::Weekday> for Weekday {
    fn from(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl FromStr for Weekday {
    type Err = ScheduleError;

    /// Case-insensitive full names ("Monday") or three-letter forms ("mon").
    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<chrono::Weekday>()
            .map(Weekday::from)
            .map_err(|_| ScheduleError::InvalidWeekday(s.trim().to_string()))
    }
}

impl TryFrom<String> for Weekday {
    type Error = ScheduleError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unordered, duplicate-free set of weekday tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecurringDays(BTreeSet<Weekday>);

impl RecurringDays {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of labels, collapsing duplicates.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidWeekday` for the first unknown label.
    pub fn from_labels<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|label| label.as_ref().parse::<Weekday>())
            .collect()
    }

    /// Parse a comma-separated list such as `"Monday,Wednesday"`.
    /// Blank segments are ignored.
    pub fn parse_list(list: &str) -> Result<Self> {
        Self::from_labels(list.split(',').filter(|part| !part.trim().is_empty()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0.contains(&day)
    }

    /// Days in Monday-first order.
    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.0.iter().copied()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.iter().map(Weekday::label).collect()
    }
}

impl FromIterator<Weekday> for RecurringDays {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Persisted events
// ---------------------------------------------------------------------------

/// Identifier assigned by the store. Opaque and immutable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An event acknowledged by the store.
///
/// Recurring days are metadata on the single base interval; they are never
/// expanded into additional occurrences.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    id: EventId,
    title: String,
    #[serde(flatten)]
    interval: Interval,
    is_recurring: bool,
    recurring_days: RecurringDays,
}

impl Event {
    /// Build an event. `recurring_days` is discarded when `is_recurring` is false.
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        interval: Interval,
        is_recurring: bool,
        recurring_days: RecurringDays,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            interval,
            is_recurring,
            recurring_days: if is_recurring {
                recurring_days
            } else {
                RecurringDays::new()
            },
        }
    }

    pub fn id(&self) -> &EventId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    /// Always empty for non-recurring events.
    pub fn recurring_days(&self) -> &RecurringDays {
        &self.recurring_days
    }
}

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// Duration as it arrives from a form: a number, a float, or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Minutes(i64),
    Fractional(f64),
    Text(String),
}

impl DurationInput {
    /// Whole, positive minutes.
    ///
    /// # Errors
    /// Returns `ScheduleError::InvalidDuration` for zero, negative, fractional,
    /// non-finite, or non-numeric input.
    pub fn minutes(&self) -> Result<i64> {
        let minutes = match self {
            DurationInput::Minutes(m) => *m,
            DurationInput::Fractional(m) => time::minutes_from_f64(*m)?,
            DurationInput::Text(s) => time::minutes_from_str(s)?,
        };
        time::duration_from_minutes(minutes)?;
        Ok(minutes)
    }
}

impl From<i64> for DurationInput {
    fn from(minutes: i64) -> Self {
        DurationInput::Minutes(minutes)
    }
}

/// A user's request to create an event, before validation. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventProposal {
    pub title: String,
    /// Wall-clock start, e.g. `2024-01-01T10:15`.
    pub start: String,
    pub duration: DurationInput,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_days: Vec<String>,
}

impl EventProposal {
    pub fn new(title: impl Into<String>, start: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            title: title.into(),
            start: start.into(),
            duration: DurationInput::Minutes(duration_minutes),
            is_recurring: false,
            recurring_days: Vec::new(),
        }
    }

    /// Mark the proposal recurring on the given weekday labels.
    pub fn recurring_on<I, S>(mut self, days: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.is_recurring = true;
        self.recurring_days = days.into_iter().map(Into::into).collect();
        self
    }

    /// Validate and normalize into a creation request.
    ///
    /// Duration is checked before the start instant, so an invalid duration
    /// is always reported as `InvalidDuration`.
    ///
    /// # Errors
    /// `InvalidDuration`, `InvalidInstant`, `InvalidTitle` (blank after trimming),
    /// or `InvalidWeekday` (only inspected when the proposal is recurring).
    pub fn validate(&self) -> Result<CreateRequest> {
        let minutes = self.duration.minutes()?;
        let interval = time::normalize(&self.start, minutes)?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(ScheduleError::InvalidTitle(
                "title must not be empty".to_string(),
            ));
        }

        let recurring_days = if self.is_recurring {
            RecurringDays::from_labels(&self.recurring_days)?
        } else {
            RecurringDays::new()
        };

        Ok(CreateRequest {
            title: title.to_string(),
            interval,
            is_recurring: self.is_recurring,
            recurring_days,
        })
    }
}

/// Outbound creation request: trimmed title, canonical timestamps, and an empty
/// day list for non-recurring events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    title: String,
    #[serde(flatten)]
    interval: Interval,
    is_recurring: bool,
    recurring_days: RecurringDays,
}

impl CreateRequest {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    pub fn recurring_days(&self) -> &RecurringDays {
        &self.recurring_days
    }

    /// The event this request becomes once the store assigns `id`.
    pub fn into_event(self, id: EventId) -> Event {
        Event::new(
            id,
            self.title,
            self.interval,
            self.is_recurring,
            self.recurring_days,
        )
    }
}
