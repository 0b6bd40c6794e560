//! # slot-engine
//!
//! Conflict detection and wall-clock time normalization for calendar event
//! scheduling.
//!
//! A proposed event (local start + duration in minutes) is normalized into a
//! half-open interval and tested against the events already scheduled. Two
//! intervals conflict iff `a.start < b.end && b.start < a.end`, so back-to-back
//! events are allowed. Times stay in the frame they were entered in; nothing is
//! reinterpreted as UTC.
//!
//! ## Modules
//!
//! - [`time`]: wall-clock parsing, `normalize` / `denormalize`, duration checks
//! - [`conflict`]: overlap predicate, `has_conflict`, `find_conflicts`
//! - [`model`]: `Interval`, `Event`, `EventProposal`, recurring-day tags
//! - [`ingest`]: parse-and-validate boundary for records fetched from a store
//! - [`scheduler`]: working-set owner and the create workflow
//! - [`error`]: Error types
//!
//! ## Quick start
//!
//! ```rust
//! use slot_engine::{has_conflict, normalize, Interval};
//!
//! let existing = vec![Interval::parse("2024-01-01T10:00", "2024-01-01T10:30").unwrap()];
//!
//! let overlapping = normalize("2024-01-01T10:15", 30).unwrap();
//! assert!(has_conflict(&overlapping, &existing));
//!
//! let back_to_back = normalize("2024-01-01T10:30", 30).unwrap();
//! assert!(!has_conflict(&back_to_back, &existing));
//! ```

pub mod conflict;
pub mod error;
pub mod ingest;
pub mod model;
pub mod scheduler;
pub mod time;

pub use conflict::{find_conflicts, has_conflict, overlaps, Conflict, Scheduled};
pub use error::{Result, ScheduleError};
pub use ingest::{admit_json, admit_records, Admission, EventRecord};
pub use model::{
    CreateRequest, DurationInput, Event, EventId, EventProposal, Interval, RecurringDays,
    Weekday,
};
pub use scheduler::{EventStore, RefreshReport, Scheduler, Verdict, WorkingSet};
pub use time::{denormalize, normalize, LocalSpan};
