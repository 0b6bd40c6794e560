//! Error types for slot-engine operations.

use thiserror::Error;

/// Shown to the user when a proposal overlaps an event already in the working set.
pub const CONFLICT_MESSAGE: &str = "This time slot conflicts with an existing event";

/// Shown to the user when the store rejects a creation request.
pub const PERSISTENCE_FAILURE_MESSAGE: &str = "Failed to create event. Please try again.";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Duration was zero, negative, non-finite, non-integral, or overflowed the calendar.
    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    /// A wall-clock string could not be parsed into a local date/time.
    #[error("Invalid instant: {0}")]
    InvalidInstant(String),

    #[error("Invalid title: {0}")]
    InvalidTitle(String),

    #[error("Invalid weekday label: {0}")]
    InvalidWeekday(String),

    /// The proposal overlaps `count` events in the working set.
    #[error("Conflicts with {count} existing event(s)")]
    ConflictDetected { count: usize },

    /// A fetched record failed the admission checks.
    #[error("Malformed event record: {0}")]
    MalformedExistingData(String),

    /// The store rejected the request or could not be reached.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl ScheduleError {
    /// Only persistence failures warrant a retry; everything else needs the user
    /// to change their input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScheduleError::PersistenceFailure(_))
    }

    /// Text suitable for showing next to the form.
    pub fn user_message(&self) -> String {
        match self {
            ScheduleError::ConflictDetected { .. } => CONFLICT_MESSAGE.to_string(),
            ScheduleError::PersistenceFailure(_) => PERSISTENCE_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
