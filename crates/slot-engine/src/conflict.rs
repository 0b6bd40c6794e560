//! Detect a proposed interval overlapping events already scheduled.
//!
//! Intervals are half-open, so two intervals overlap when
//! `a.start < b.end && b.start < a.end`. Back-to-back events (one ends exactly
//! when the other starts) are NOT conflicts. Every function here is a linear
//! scan over its input and never mutates it.

use crate::model::{Event, Interval};

/// Anything that occupies a slot on the calendar.
pub trait Scheduled {
    fn interval(&self) -> &Interval;
}

impl Scheduled for Interval {
    fn interval(&self) -> &Interval {
        self
    }
}

impl Scheduled for Event {
    fn interval(&self) -> &Interval {
        Event::interval(self)
    }
}

impl<T: Scheduled + ?Sized> Scheduled for &T {
    fn interval(&self) -> &Interval {
        (**self).interval()
    }
}

/// An existing item that overlaps the proposal.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict<'a, T> {
    pub existing: &'a T,
    pub overlap_minutes: i64,
}

/// The overlap predicate for two half-open intervals.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.overlaps(b)
}

/// `true` if `proposed` overlaps any item in `existing`.
///
/// An empty `existing` slice never conflicts.
pub fn has_conflict<T: Scheduled>(proposed: &Interval, existing: &[T]) -> bool {
    existing
        .iter()
        .any(|item| overlaps(proposed, item.interval()))
}

/// Every item in `existing` that overlaps `proposed`, in input order.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts<'a, T: Scheduled>(
    proposed: &Interval,
    existing: &'a [T],
) -> Vec<Conflict<'a, T>> {
    existing
        .iter()
        .filter_map(|item| {
            proposed
                .overlap_minutes(item.interval())
                .map(|overlap_minutes| Conflict {
                    existing: item,
                    overlap_minutes,
                })
        })
        .collect()
}

/// Index pairs `(i, j)` with `i < j` whose intervals overlap each other.
///
/// Diagnoses a snapshot that already breaks the no-overlap invariant; it does not
/// repair anything. Pairs are ordered by `i`, then `j`.
pub fn find_overlapping_pairs<T: Scheduled>(items: &[T]) -> Vec<(usize, usize)> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by_key(|&i| *items[i].interval());

    let mut pairs = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        let current = items[i].interval();
        // Sorted by start: once a later item starts at or after our end, none
        // of the remaining ones can overlap us.
        for &j in &order[pos + 1..] {
            let next = items[j].interval();
            if next.start() >= current.end() {
                break;
            }
            pairs.push((i.min(j), i.max(j)));
        }
    }

    pairs.sort_unstable();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(start: &str, end: &str) -> Interval {
        Interval::parse(start, end).unwrap()
    }

    #[test]
    fn pairs_found_regardless_of_input_order() {
        let items = vec![
            iv("2024-01-01T12:00", "2024-01-01T13:00"),
            iv("2024-01-01T09:00", "2024-01-01T10:00"),
            iv("2024-01-01T12:30", "2024-01-01T12:45"),
            iv("2024-01-01T09:30", "2024-01-01T11:00"),
        ];
        assert_eq!(find_overlapping_pairs(&items), vec![(0, 2), (1, 3)]);
    }

    #[test]
    fn abutting_items_are_not_paired() {
        let items = vec![
            iv("2024-01-01T09:00", "2024-01-01T10:00"),
            iv("2024-01-01T10:00", "2024-01-01T11:00"),
        ];
        assert!(find_overlapping_pairs(&items).is_empty());
    }
}
