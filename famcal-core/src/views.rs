//! Derived views over an aggregated, filtered event list.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::event::{Category, Event, Source};

/// Events on `date`, in list order.
pub fn events_for_date(events: &[Event], date: NaiveDate) -> Vec<&Event> {
    events.iter().filter(|e| e.date == date).collect()
}

/// Whether any event falls on `date`.
pub fn has_events_on(events: &[Event], date: NaiveDate) -> bool {
    events.iter().any(|e| e.date == date)
}

/// Event counts per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub local: usize,
    pub ical: usize,
    pub notion: usize,
    pub total: usize,
}

pub fn events_by_source(events: &[Event]) -> SourceCounts {
    let mut counts = SourceCounts {
        total: events.len(),
        ..SourceCounts::default()
    };

    for event in events {
        if event.is_local() {
            counts.local += 1;
            continue;
        }
        match event.source {
            Source::Ical => counts.ical += 1,
            Source::Notion => counts.notion += 1,
            Source::Local => counts.local += 1,
        }
    }

    counts
}

/// Events grouped by the fixed categories. Every known category has an
/// entry; events with other categories are left out.
pub fn events_by_category(events: &[Event]) -> HashMap<Category, Vec<&Event>> {
    let mut groups: HashMap<Category, Vec<&Event>> = Category::KNOWN
        .iter()
        .map(|c| (c.clone(), Vec::new()))
        .collect();

    for event in events {
        if let Some(group) = groups.get_mut(&event.category) {
            group.push(event);
        }
    }

    groups
}
