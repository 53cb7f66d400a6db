//! Pure bookkeeping for tracked-field history.
//!
//! The store decides *when* to write; this module decides *what* to write and
//! how to read it back.

use chrono::{DateTime, Utc};

use super::{FieldChange, HistoryEntry, Ticket, TrackedField};

/// Tracked fields that differ between `before` and `after`, in
/// [`TrackedField::ALL`] order.
pub fn tracked_changes(before: &Ticket, after: &Ticket) -> Vec<FieldChange> {
    TrackedField::ALL
        .into_iter()
        .filter_map(|field| {
            let old_value = before.tracked_value(field);
            let new_value = after.tracked_value(field);
            (old_value != new_value).then_some(FieldChange {
                field,
                old_value,
                new_value,
            })
        })
        .collect()
}

/// Timestamp for the next entry: `now` at microsecond precision, bumped to
/// one microsecond after `last` when the clock has not moved past it.
pub fn next_timestamp(now: DateTime<Utc>, last: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now_micros = now.timestamp_micros();
    let micros = match last {
        Some(last) => now_micros.max(last.timestamp_micros() + 1),
        None => now_micros,
    };
    DateTime::<Utc>::from_timestamp_micros(micros).unwrap_or(now)
}

fn ordered<'a>(
    entries: &'a [HistoryEntry],
    field: TrackedField,
) -> impl Iterator<Item = &'a HistoryEntry> {
    let mut relevant: Vec<&HistoryEntry> =
        entries.iter().filter(|entry| entry.field == field).collect();
    relevant.sort_by(|a, b| a.changed_at.cmp(&b.changed_at).then(a.id.cmp(&b.id)));
    relevant.into_iter()
}

/// Reconstruct a field's current value by last-write-wins replay from its
/// value at creation.
pub fn replay(
    initial: Option<String>,
    entries: &[HistoryEntry],
    field: TrackedField,
) -> Option<String> {
    ordered(entries, field).fold(initial, |_, entry| entry.new_value.clone())
}

/// Value a field had at instant `at`.
pub fn value_at(
    initial: Option<String>,
    entries: &[HistoryEntry],
    field: TrackedField,
    at: DateTime<Utc>,
) -> Option<String> {
    ordered(entries, field)
        .take_while(|entry| entry.changed_at <= at)
        .fold(initial, |_, entry| entry.new_value.clone())
}

/// Value a field had when the ticket was created: the first entry's old value,
/// or `current` if the field never changed.
pub fn initial_value(
    entries: &[HistoryEntry],
    field: TrackedField,
    current: Option<String>,
) -> Option<String> {
    match ordered(entries, field).next() {
        Some(first) => first.old_value.clone(),
        None => current,
    }
}
