//! Combine per-source event lists into one ordered, de-duplicated stream.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::event::Event;

/// Merge local, iCal and Notion events.
///
/// Events with the same title, day and time label are duplicates; the first
/// one wins, so local beats iCal beats Notion, and within a source the
/// earlier entry wins. The result is sorted by [`compare_events`].
pub fn aggregate(local: &[Event], ical: &[Event], notion: &[Event]) -> Vec<Event> {
    let mut seen = HashSet::new();

    let mut events: Vec<Event> = local
        .iter()
        .chain(ical)
        .chain(notion)
        .filter(|event| seen.insert(event.dedupe_key()))
        .cloned()
        .collect();

    sort_events(&mut events);
    events
}

/// Stable chronological sort.
pub fn sort_events(events: &mut [Event]) {
    events.sort_by(compare_events);
}

/// Day first; within a day all-day events, then timed events by start time,
/// then events whose time cannot be read.
pub fn compare_events(a: &Event, b: &Event) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| time_rank(a).cmp(&time_rank(b)))
}

fn time_rank(event: &Event) -> (u8, u32) {
    if event.is_all_day() {
        return (0, 0);
    }
    match event.time.start_minutes() {
        Some(minutes) => (1, minutes),
        None => (2, 0),
    }
}
