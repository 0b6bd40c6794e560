//! Admission boundary for event records fetched from a store.
//!
//! Payloads from a store are untrusted. Each record is decoded into a loosely
//! typed [`EventRecord`], then checked field by field. Records that fail are
//! quarantined with a logged reason; they never enter the working set, and one
//! bad record never aborts the rest of the batch.
//!
//! Both the canonical camelCase shape and the backend's snake_case shape are
//! accepted:
//!
//! ```json
//! {"id": "7", "title": "Standup", "start": "2024-01-01T10:00:00",
//!  "end": "2024-01-01T10:30:00", "isRecurring": false, "recurringDays": []}
//! {"id": 7, "name": "Standup", "start_time": "2024-01-01T10:00:00",
//!  "end_time": "2024-01-01T10:30:00", "is_recurring": true, "days_of_week": "Monday,Friday"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Result, ScheduleError};
use crate::model::{Event, EventId, Interval, RecurringDays};
use crate::time;

/// Record identifiers arrive as integers or strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

/// Recurring days arrive as a list or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordDays {
    List(Vec<String>),
    Joined(String),
}

/// An event record as fetched, before any checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default)]
    pub id: Option<RecordId>,
    #[serde(default, alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "start_time")]
    pub start: Option<String>,
    #[serde(default, alias = "end_time")]
    pub end: Option<String>,
    #[serde(default, alias = "is_recurring")]
    pub is_recurring: Option<bool>,
    #[serde(default, alias = "days_of_week")]
    pub recurring_days: Option<RecordDays>,
}

impl From<&Event> for EventRecord {
    fn from(event: &Event) -> Self {
        Self {
            id: Some(RecordId::Text(event.id().as_str().to_string())),
            title: Some(event.title().to_string()),
            start: Some(event.interval().start_canonical()),
            end: Some(event.interval().end_canonical()),
            is_recurring: Some(event.is_recurring()),
            recurring_days: Some(RecordDays::List(
                event
                    .recurring_days()
                    .labels()
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            )),
        }
    }
}

/// A record that was kept out of the working set.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    /// Position in the fetched batch.
    pub index: usize,
    pub error: ScheduleError,
}

/// Outcome of admitting a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Admission {
    pub events: Vec<Event>,
    pub rejected: Vec<Rejection>,
}

fn malformed(reason: impl Into<String>) -> ScheduleError {
    ScheduleError::MalformedExistingData(reason.into())
}

/// Check one record and turn it into an [`Event`].
///
/// Required: an `id`, a non-blank `title`, parseable `start` and `end`, and
/// `start < end`. When `isRecurring` is absent or false the stored days are
/// ignored.
///
/// # Errors
/// Returns `ScheduleError::MalformedExistingData` naming the first failed check.
pub fn admit_record(record: EventRecord) -> Result<Event> {
    let id = match record.id {
        Some(RecordId::Number(n)) => EventId::new(n.to_string()),
        Some(RecordId::Text(s)) if !s.trim().is_empty() => EventId::new(s.trim()),
        _ => return Err(malformed("missing id")),
    };

    let title = record
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed(format!("event {} has no title", id)))?
        .to_string();

    let start = record
        .start
        .as_deref()
        .ok_or_else(|| malformed(format!("event {} has no start", id)))
        .and_then(|s| {
            time::parse_wall_clock(s).map_err(|e| malformed(format!("event {} start: {}", id, e)))
        })?;
    let end = record
        .end
        .as_deref()
        .ok_or_else(|| malformed(format!("event {} has no end", id)))
        .and_then(|s| {
            time::parse_wall_clock(s).map_err(|e| malformed(format!("event {} end: {}", id, e)))
        })?;
    let interval = Interval::new(start, end).map_err(|e| malformed(format!("event {}: {}", id, e)))?;

    let is_recurring = record.is_recurring.unwrap_or(false);
    let recurring_days = if is_recurring {
        let parsed = match &record.recurring_days {
            None => Ok(RecurringDays::new()),
            Some(RecordDays::List(labels)) => RecurringDays::from_labels(labels),
            Some(RecordDays::Joined(list)) => RecurringDays::parse_list(list),
        };
        parsed.map_err(|e| malformed(format!("event {}: {}", id, e)))?
    } else {
        RecurringDays::new()
    };

    Ok(Event::new(id, title, interval, is_recurring, recurring_days))
}

/// Admit a batch of records, quarantining the malformed ones.
///
/// Each rejection is logged at `warn` with its batch index.
pub fn admit_records(records: impl IntoIterator<Item = EventRecord>) -> Admission {
    admit_indexed(records.into_iter().map(Ok))
}

/// Decode and admit a raw JSON payload as fetched from a store.
///
/// A payload that is not an array is an empty snapshot. Elements that do not
/// decode as a record are rejected with their batch index, alongside records
/// that decode but fail the field checks.
pub fn admit_json(payload: &Value) -> Admission {
    let Some(items) = payload.as_array() else {
        warn!(
            kind = json_kind(payload),
            "event payload is not an array; treating as empty"
        );
        return Admission::default();
    };

    admit_indexed(items.iter().map(|item| {
        EventRecord::deserialize(item).map_err(|e| malformed(format!("undecodable record: {}", e)))
    }))
}

fn admit_indexed(records: impl Iterator<Item = Result<EventRecord>>) -> Admission {
    let mut admission = Admission::default();
    for (index, record) in records.enumerate() {
        match record.and_then(admit_record) {
            Ok(event) => admission.events.push(event),
            Err(error) => {
                warn!(index, %error, "excluding fetched event from working set");
                admission.rejected.push(Rejection { index, error });
            }
        }
    }
    admission
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
