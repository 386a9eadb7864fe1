//! Occurrence identity and change detection.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::event::Event;

/// Namespace for occurrence ids (UUID v5).
const OCCURRENCE_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_3c2a_8b4e_4f0a_9c57_2e81_b0d4_a913);

/// Stable id for one occurrence of a definition on a calendar day.
///
/// Same inputs always give the same id, so repeated syncs of an unchanged
/// definition produce identical occurrences.
pub fn occurrence_id(uid: &str, calendar_id: &str, date: NaiveDate, is_multi_day: bool) -> String {
    let key = format!(
        "{}|{}|{}|{}",
        uid,
        calendar_id,
        date.format("%Y-%m-%d"),
        if is_multi_day { "multi" } else { "single" }
    );
    Uuid::new_v5(&OCCURRENCE_NAMESPACE, key.as_bytes()).to_string()
}

/// Whether any user-visible field differs between two versions of an occurrence.
pub fn has_changed(prev: &Event, next: &Event) -> bool {
    prev.title != next.title
        || prev.time != next.time
        || prev.location != next.location
        || prev.description != next.description
        || prev.date != next.date
}
