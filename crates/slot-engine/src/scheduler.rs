//! Working-set ownership and the event-creation workflow.
//!
//! [`Scheduler`] is the single owner of the working set. A submission runs
//! validate → normalize → conflict check → persist → merge → refresh, and
//! `submit` takes `&mut self`, so check-then-insert cannot interleave with
//! another submission on the same scheduler. Callers sharing one scheduler
//! across threads must wrap it in a `Mutex` and hold the lock for the whole
//! `submit` call; checking against a snapshot and inserting under a separate
//! lock reintroduces the race.
//!
//! The guarantee ends at the scheduler. Two processes, each with its own
//! scheduler over the same store, can both pass the check; only the store can
//! serialize them.
//!
//! Freshness is the caller's job: a check only sees what the last
//! [`Scheduler::refresh`] admitted.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::conflict::{self, Conflict};
use crate::error::{Result, ScheduleError, CONFLICT_MESSAGE};
use crate::ingest;
use crate::model::{CreateRequest, Event, EventId, EventProposal, Interval};

/// Persistence collaborator. Implementations map their own failures to
/// `ScheduleError::PersistenceFailure`.
pub trait EventStore {
    /// The raw payload the store currently holds, unvalidated. Shape checks
    /// happen on admission, so a store should not filter or decode it.
    fn fetch_events(&self) -> Result<Value>;

    /// Persist a new event and return the identifier the store assigned.
    fn create_event(&mut self, request: &CreateRequest) -> Result<EventId>;
}

impl<S: EventStore + ?Sized> EventStore for Box<S> {
    fn fetch_events(&self) -> Result<Value> {
        (**self).fetch_events()
    }

    fn create_event(&mut self, request: &CreateRequest) -> Result<EventId> {
        (**self).create_event(request)
    }
}

/// The events currently believed to exist.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    events: Vec<Event>,
}

impl WorkingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an admitted snapshot. See [`WorkingSet::replace`].
    pub fn from_events(events: Vec<Event>) -> Self {
        let mut set = Self::new();
        set.replace(events);
        set
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.iter().find(|e| e.id() == id)
    }

    /// Events ordered by interval.
    pub fn sorted(&self) -> Vec<&Event> {
        let mut sorted: Vec<&Event> = self.events.iter().collect();
        sorted.sort_by_key(|e| *e.interval());
        sorted
    }

    /// Existing events overlapping `proposed`.
    pub fn conflicts_with(&self, proposed: &Interval) -> Vec<Conflict<'_, Event>> {
        conflict::find_conflicts(proposed, &self.events)
    }

    /// Discard the current snapshot in favour of `events`.
    ///
    /// A snapshot that already contains overlapping events is kept as is and
    /// logged; repairing it is not this type's job.
    pub fn replace(&mut self, events: Vec<Event>) {
        for (i, j) in conflict::find_overlapping_pairs(&events) {
            warn!(
                first = %events[i].id(),
                second = %events[j].id(),
                "snapshot already contains overlapping events"
            );
        }
        self.events = events;
    }

    /// Insert `event`, replacing any entry with the same id.
    fn merge(&mut self, event: Event) {
        match self.events.iter_mut().find(|e| e.id() == event.id()) {
            Some(slot) => *slot = event,
            None => self.events.push(event),
        }
    }
}

/// One overlapping event, as reported to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub id: EventId,
    pub title: String,
    #[serde(flatten)]
    pub interval: Interval,
    pub overlap_minutes: i64,
}

impl From<&Conflict<'_, Event>> for ConflictSummary {
    fn from(c: &Conflict<'_, Event>) -> Self {
        Self {
            id: c.existing.id().clone(),
            title: c.existing.title().to_string(),
            interval: *c.existing.interval(),
            overlap_minutes: c.overlap_minutes,
        }
    }
}

/// Result of checking a proposal without persisting it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub conflict: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub interval: Interval,
    pub conflicts: Vec<ConflictSummary>,
}

impl Verdict {
    pub fn evaluate(interval: Interval, working_set: &WorkingSet) -> Self {
        let conflicts: Vec<ConflictSummary> = working_set
            .conflicts_with(&interval)
            .iter()
            .map(ConflictSummary::from)
            .collect();
        let conflict = !conflicts.is_empty();
        Self {
            conflict,
            message: conflict.then(|| CONFLICT_MESSAGE.to_string()),
            interval,
            conflicts,
        }
    }
}

/// Counts from the last refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub admitted: usize,
    pub rejected: usize,
}

/// Owns the working set and drives proposals through the store.
pub struct Scheduler<S> {
    store: S,
    working_set: WorkingSet,
}

impl<S: EventStore> Scheduler<S> {
    /// Start with an empty working set. Call [`Scheduler::refresh`] to load one.
    pub fn new(store: S) -> Self {
        Self {
            store,
            working_set: WorkingSet::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.working_set
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Replace the working set with a fresh snapshot from the store.
    ///
    /// Malformed records, including elements that are not event objects at
    /// all, are excluded and counted.
    ///
    /// # Errors
    /// Returns `ScheduleError::PersistenceFailure` when the fetch fails; the
    /// previous snapshot is kept.
    pub fn refresh(&mut self) -> Result<RefreshReport> {
        let payload = self.store.fetch_events().map_err(as_persistence_failure)?;
        let admission = ingest::admit_json(&payload);
        let report = RefreshReport {
            admitted: admission.events.len(),
            rejected: admission.rejected.len(),
        };
        self.working_set.replace(admission.events);
        debug!(
            admitted = report.admitted,
            rejected = report.rejected,
            "working set refreshed"
        );
        Ok(report)
    }

    /// Validate a proposal and test it against the current snapshot.
    ///
    /// A conflict is reported in the verdict, not as an error.
    ///
    /// # Errors
    /// Validation errors from [`EventProposal::validate`].
    pub fn check(&self, proposal: &EventProposal) -> Result<Verdict> {
        let request = proposal.validate()?;
        let verdict = Verdict::evaluate(*request.interval(), &self.working_set);
        debug!(
            interval = %verdict.interval,
            conflicts = verdict.conflicts.len(),
            "proposal checked"
        );
        Ok(verdict)
    }

    /// Create an event if it fits.
    ///
    /// The working set is only touched after the store acknowledges the event.
    /// It is then merged locally and reconciled by a full refresh; if that
    /// refresh fails, the merged snapshot stays in place.
    ///
    /// # Errors
    /// - validation errors from [`EventProposal::validate`]
    /// - `ScheduleError::ConflictDetected` if the proposal overlaps the working set
    /// - `ScheduleError::PersistenceFailure` if the store rejects the request
    pub fn submit(&mut self, proposal: &EventProposal) -> Result<Event> {
        let request = proposal.validate()?;

        let count = self.working_set.conflicts_with(request.interval()).len();
        if count > 0 {
            debug!(interval = %request.interval(), count, "proposal rejected: overlap");
            return Err(ScheduleError::ConflictDetected { count });
        }

        let id = self
            .store
            .create_event(&request)
            .map_err(as_persistence_failure)?;
        let event = request.into_event(id);
        info!(id = %event.id(), interval = %event.interval(), "event created");

        self.working_set.merge(event.clone());
        if let Err(error) = self.refresh() {
            warn!(%error, "refresh after create failed; keeping merged snapshot");
        }

        Ok(event)
    }
}

fn as_persistence_failure(error: ScheduleError) -> ScheduleError {
    match error {
        ScheduleError::PersistenceFailure(_) => error,
        other => ScheduleError::PersistenceFailure(other.to_string()),
    }
}
