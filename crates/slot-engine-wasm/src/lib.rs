//! WASM bindings for slot-engine.
//!
//! Exposes normalization, conflict detection, and proposal checks to JavaScript
//! via `wasm-bindgen`. All complex types are passed as JSON strings. Each export
//! is a thin wrapper over a plain-Rust function returning `Result<_, String>`,
//! which is what the unit tests exercise.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p slot-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/slot_engine_wasm.wasm
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slot_engine::scheduler::{Verdict, WorkingSet};
use slot_engine::time::minutes_from_f64;
use slot_engine::{EventProposal, Interval};
use tracing::warn;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConflictDto {
    start: String,
    end: String,
    overlap_minutes: i64,
}

#[derive(Serialize)]
struct SpanDto {
    start: String,
    end: String,
}

/// Loose `{start, end}` shape; events may carry more fields.
#[derive(Deserialize)]
struct IntervalInput {
    start: String,
    end: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_interval(json: &str) -> Result<Interval, String> {
    let input: IntervalInput =
        serde_json::from_str(json).map_err(|e| format!("Invalid interval JSON: {}", e))?;
    Interval::parse(&input.start, &input.end).map_err(|e| e.to_string())
}

/// Intervals parsed from an untrusted JSON array, plus the positions that were
/// left out.
struct Existing {
    intervals: Vec<Interval>,
    skipped: Vec<usize>,
}

/// Intervals from a JSON array of `{start, end}` objects.
///
/// A payload that is not an array yields nothing. Elements without a valid
/// interval are skipped and logged with their index.
fn parse_existing(json: &str) -> Existing {
    let mut existing = Existing {
        intervals: Vec::new(),
        skipped: Vec::new(),
    };
    let items = match serde_json::from_str::<Value>(json) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!("existing events payload is not an array; treating as empty");
            return existing;
        }
        Err(error) => {
            warn!(%error, "existing events payload is not valid JSON; treating as empty");
            return existing;
        }
    };

    for (index, item) in items.into_iter().enumerate() {
        let parsed = serde_json::from_value::<IntervalInput>(item)
            .map_err(|e| e.to_string())
            .and_then(|input| {
                Interval::parse(&input.start, &input.end).map_err(|e| e.to_string())
            });
        match parsed {
            Ok(interval) => existing.intervals.push(interval),
            Err(error) => {
                warn!(index, %error, "skipping existing event without a valid interval");
                existing.skipped.push(index);
            }
        }
    }
    existing
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn normalize_impl(start: &str, duration_minutes: f64) -> Result<String, String> {
    let minutes = minutes_from_f64(duration_minutes).map_err(|e| e.to_string())?;
    let interval = slot_engine::normalize(start, minutes).map_err(|e| e.to_string())?;
    to_json(&interval)
}

fn denormalize_impl(interval_json: &str) -> Result<String, String> {
    let span = slot_engine::denormalize(&parse_interval(interval_json)?);
    to_json(&SpanDto {
        start: span.start,
        end: span.end,
    })
}

fn has_conflict_impl(proposed_json: &str, existing_json: &str) -> Result<bool, String> {
    let proposed = parse_interval(proposed_json)?;
    Ok(slot_engine::has_conflict(
        &proposed,
        &parse_existing(existing_json).intervals,
    ))
}

fn find_conflicts_impl(proposed_json: &str, existing_json: &str) -> Result<String, String> {
    let proposed = parse_interval(proposed_json)?;
    let existing = parse_existing(existing_json).intervals;
    let dtos: Vec<ConflictDto> = slot_engine::find_conflicts(&proposed, &existing)
        .iter()
        .map(|c| ConflictDto {
            start: c.existing.start_canonical(),
            end: c.existing.end_canonical(),
            overlap_minutes: c.overlap_minutes,
        })
        .collect();
    to_json(&dtos)
}

fn check_proposal_impl(proposal_json: &str, events_json: &str) -> Result<String, String> {
    let proposal: EventProposal =
        serde_json::from_str(proposal_json).map_err(|e| format!("Invalid proposal JSON: {}", e))?;
    let request = proposal.validate().map_err(|e| e.user_message())?;

    // Malformed or non-array event payloads become an empty working set.
    let events = serde_json::from_str::<Value>(events_json).unwrap_or(Value::Null);
    let working_set = WorkingSet::from_events(slot_engine::admit_json(&events).events);

    to_json(&Verdict::evaluate(*request.interval(), &working_set))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Normalize a wall-clock start and a duration into `{start, end}` canonical
/// timestamps.
#[wasm_bindgen(js_name = "normalize")]
pub fn normalize(start: &str, duration_minutes: f64) -> Result<String, JsValue> {
    normalize_impl(start, duration_minutes).map_err(|e| JsValue::from_str(&e))
}

/// Display strings for an interval JSON object.
#[wasm_bindgen(js_name = "denormalize")]
pub fn denormalize(interval_json: &str) -> Result<String, JsValue> {
    denormalize_impl(interval_json).map_err(|e| JsValue::from_str(&e))
}

/// `true` if the proposed `{start, end}` overlaps any interval in the array.
#[wasm_bindgen(js_name = "hasConflict")]
pub fn has_conflict(proposed_json: &str, existing_json: &str) -> Result<bool, JsValue> {
    has_conflict_impl(proposed_json, existing_json).map_err(|e| JsValue::from_str(&e))
}

/// Every interval in the array that overlaps the proposal, with overlap minutes.
#[wasm_bindgen(js_name = "findConflicts")]
pub fn find_conflicts(proposed_json: &str, existing_json: &str) -> Result<String, JsValue> {
    find_conflicts_impl(proposed_json, existing_json).map_err(|e| JsValue::from_str(&e))
}

/// Validate a form proposal and check it against fetched events.
///
/// Returns the verdict JSON; an invalid proposal is an error carrying the
/// user-facing message.
#[wasm_bindgen(js_name = "checkProposal")]
pub fn check_proposal(proposal_json: &str, events_json: &str) -> Result<String, JsValue> {
    check_proposal_impl(proposal_json, events_json).map_err(|e| JsValue::from_str(&e))
}
