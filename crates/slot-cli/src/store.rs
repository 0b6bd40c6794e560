//! JSON-file event store.
//!
//! The file holds one JSON array of event objects. A missing file is an empty
//! store. Ids are assigned here as the next integer after the largest numeric
//! id already present.
//!
//! The file is not locked. Each write replaces the whole array, so two `slot`
//! processes adding events to the same file at once can both pass the conflict
//! check and the later rename drops the earlier event. Callers must not run
//! concurrent writers against one store file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use slot_engine::model::CreateRequest;
use slot_engine::{EventId, EventStore, Result, ScheduleError};
use tracing::{debug, warn};

pub struct JsonFileStore {
    path: PathBuf,
}

enum Contents {
    Missing,
    Parsed(Value),
    Unparseable(String),
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Contents> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Contents::Missing),
            Err(e) => {
                return Err(ScheduleError::PersistenceFailure(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if text.trim().is_empty() {
            return Ok(Contents::Missing);
        }
        Ok(match serde_json::from_str(&text) {
            Ok(value) => Contents::Parsed(value),
            Err(e) => Contents::Unparseable(e.to_string()),
        })
    }

    /// Write via a sibling temp file so a crash never leaves half an array.
    fn write(&self, items: &[Value]) -> Result<()> {
        let failure = |e: io::Error| {
            ScheduleError::PersistenceFailure(format!("cannot write {}: {}", self.path.display(), e))
        };
        let body = serde_json::to_string_pretty(items)
            .map_err(|e| ScheduleError::PersistenceFailure(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, body + "\n").map_err(failure)?;
        fs::rename(&tmp, &self.path).map_err(failure)
    }
}

impl EventStore for JsonFileStore {
    fn fetch_events(&self) -> Result<Value> {
        match self.read()? {
            Contents::Missing => Ok(Value::Array(Vec::new())),
            Contents::Parsed(value) => Ok(value),
            Contents::Unparseable(error) => {
                warn!(path = %self.path.display(), %error, "store file is not valid JSON; treating as empty");
                Ok(Value::Array(Vec::new()))
            }
        }
    }

    fn create_event(&mut self, request: &CreateRequest) -> Result<EventId> {
        let mut items = match self.read()? {
            Contents::Missing => Vec::new(),
            Contents::Parsed(Value::Array(items)) => items,
            Contents::Parsed(_) | Contents::Unparseable(_) => {
                return Err(ScheduleError::PersistenceFailure(format!(
                    "{} does not hold a JSON array; refusing to overwrite it",
                    self.path.display()
                )))
            }
        };

        let next = items
            .iter()
            .filter_map(|item| item.get("id").and_then(numeric_id))
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                ScheduleError::PersistenceFailure(format!(
                    "{} has no free numeric id left",
                    self.path.display()
                ))
            })?;
        let id = EventId::new(next.to_string());

        let event = request.clone().into_event(id.clone());
        let value = serde_json::to_value(&event)
            .map_err(|e| ScheduleError::PersistenceFailure(e.to_string()))?;
        items.push(value);
        self.write(&items)?;

        debug!(%id, path = %self.path.display(), "event written");
        Ok(id)
    }
}

fn numeric_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
