//! Calendar-selection filter.

use std::collections::HashSet;

use crate::event::Event;

/// Whether the event stream holds real events or only placeholder content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No source contributed a real event; the stream is sample content.
    Placeholder,
    Live,
}

impl FeedState {
    /// `Placeholder` when every source list is empty.
    pub fn detect(local: &[Event], ical: &[Event], notion: &[Event]) -> Self {
        if local.is_empty() && ical.is_empty() && notion.is_empty() {
            FeedState::Placeholder
        } else {
            FeedState::Live
        }
    }
}

/// Keep events whose calendar is selected, preserving order.
///
/// Placeholder streams bypass the filter so a first run still shows
/// something. For live streams an empty selection yields nothing.
pub fn filter_by_selection(
    events: &[Event],
    selected: &HashSet<String>,
    state: FeedState,
) -> Vec<Event> {
    match state {
        FeedState::Placeholder => events.to_vec(),
        FeedState::Live => events
            .iter()
            .filter(|event| selected.contains(event.calendar_id_or_default()))
            .cloned()
            .collect(),
    }
}
