//! The full aggregation pass: buckets → aggregate → selection filter → views.

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate};

use crate::aggregate::aggregate;
use crate::event::{Category, Event, EventId, Source, TimeLabel};
use crate::filter::{FeedState, filter_by_selection};
use crate::views::{SourceCounts, events_by_category, events_by_source, events_for_date, has_events_on};

const SAMPLE_CALENDAR_ID: &str = "sample_calendar";

/// Events of one sync pass, grouped by source.
#[derive(Debug, Clone, Default)]
pub struct SourceBuckets {
    pub local: Vec<Event>,
    pub ical: Vec<Event>,
    pub notion: Vec<Event>,
}

impl SourceBuckets {
    /// Route events into the bucket of their source.
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            if event.is_local() {
                self.local.push(event);
                continue;
            }
            match event.source {
                Source::Local => self.local.push(event),
                Source::Ical => self.ical.push(event),
                Source::Notion => self.notion.push(event),
            }
        }
    }

    pub fn state(&self) -> FeedState {
        FeedState::detect(&self.local, &self.ical, &self.notion)
    }
}

/// The aggregated, filtered event list the UI renders.
#[derive(Debug, Clone)]
pub struct Feed {
    events: Vec<Event>,
    state: FeedState,
}

impl Feed {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn state(&self) -> FeedState {
        self.state
    }

    pub fn is_placeholder(&self) -> bool {
        self.state == FeedState::Placeholder
    }

    pub fn for_date(&self, date: NaiveDate) -> Vec<&Event> {
        events_for_date(&self.events, date)
    }

    pub fn has_events_on(&self, date: NaiveDate) -> bool {
        has_events_on(&self.events, date)
    }

    pub fn by_source(&self) -> SourceCounts {
        events_by_source(&self.events)
    }

    pub fn by_category(&self) -> HashMap<Category, Vec<&Event>> {
        events_by_category(&self.events)
    }
}

/// Aggregate the buckets and apply the calendar selection.
///
/// When no source produced anything, the feed is the sample set around
/// `today` and the selection is ignored.
pub fn build_feed(buckets: &SourceBuckets, selected: &HashSet<String>, today: NaiveDate) -> Feed {
    let state = buckets.state();

    let events = match state {
        FeedState::Placeholder => sample_events(today),
        FeedState::Live => aggregate(&buckets.local, &buckets.ical, &buckets.notion),
    };

    Feed {
        events: filter_by_selection(&events, selected, state),
        state,
    }
}

/// Placeholder events shown before any calendar has content.
pub fn sample_events(today: NaiveDate) -> Vec<Event> {
    let day = |offset: u64| today.checked_add_days(Days::new(offset)).unwrap_or(today);

    let samples = [
        ("Family dinner", day(0), TimeLabel::span("6:00 PM", "7:30 PM"), Category::Family),
        ("Soccer practice", day(1), TimeLabel::span("4:00 PM", "5:30 PM"), Category::Kids),
        ("Team meeting", day(2), TimeLabel::span("10:00 AM", "11:00 AM"), Category::Work),
        ("Yoga", day(3), TimeLabel::span("7:00 AM", "8:00 AM"), Category::Personal),
        ("Public holiday", day(6), TimeLabel::all_day(), Category::Holidays),
    ];

    samples
        .into_iter()
        .enumerate()
        .map(|(i, (title, date, time, category))| Event {
            id: EventId::Text(format!("sample-{}", i + 1)),
            title: title.to_string(),
            date,
            time,
            location: String::new(),
            description: String::new(),
            organizer: String::new(),
            category,
            color: String::new(),
            calendar_id: Some(SAMPLE_CALENDAR_ID.to_string()),
            calendar_name: Some("Sample".to_string()),
            source: Source::Local,
            is_multi_day: false,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::LOCAL_CALENDAR_ID;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn event(id: &str, title: &str, calendar_id: &str, source: Source) -> Event {
        Event {
            id: EventId::from(id),
            title: title.to_string(),
            date: today(),
            time: TimeLabel::from("10:00 AM - 11:00 AM"),
            location: String::new(),
            description: String::new(),
            organizer: String::new(),
            category: Category::Work,
            color: String::new(),
            calendar_id: Some(calendar_id.to_string()),
            calendar_name: None,
            source,
            is_multi_day: false,
        }
    }

    #[test]
    fn test_empty_sources_show_samples_regardless_of_selection() {
        let feed = build_feed(&SourceBuckets::default(), &HashSet::new(), today());

        assert!(feed.is_placeholder());
        assert_eq!(feed.events().len(), 5);
        assert!(feed.has_events_on(today()));
    }

    #[test]
    fn test_live_feed_dedupes_and_filters() {
        let mut buckets = SourceBuckets::default();
        buckets.extend(vec![
            event("l1", "Team Sync", LOCAL_CALENDAR_ID, Source::Local),
            event("i1", "Team Sync", "work", Source::Ical),
            event("i2", "Standup", "work", Source::Ical),
            event("n1", "Chores", "board", Source::Notion),
        ]);
        assert_eq!(buckets.local.len(), 1);
        assert_eq!(buckets.ical.len(), 2);
        assert_eq!(buckets.notion.len(), 1);

        let selected: HashSet<String> = [LOCAL_CALENDAR_ID.to_string(), "work".to_string()]
            .into_iter()
            .collect();
        let feed = build_feed(&buckets, &selected, today());

        assert!(!feed.is_placeholder());
        let ids: Vec<_> = feed.events().iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["l1", "i2"]);
        assert_eq!(
            feed.by_source(),
            SourceCounts {
                local: 1,
                ical: 1,
                notion: 0,
                total: 2
            }
        );
        assert_eq!(feed.by_category()[&Category::Work].len(), 2);
    }

    #[test]
    fn test_live_feed_with_empty_selection_is_empty() {
        let mut buckets = SourceBuckets::default();
        buckets.extend(vec![event("i1", "Standup", "work", Source::Ical)]);

        let feed = build_feed(&buckets, &HashSet::new(), today());
        assert!(feed.events().is_empty());
    }

    #[test]
    fn test_build_feed_is_deterministic() {
        let mut buckets = SourceBuckets::default();
        buckets.extend(vec![
            event("i2", "Standup", "work", Source::Ical),
            event("i1", "Review", "work", Source::Ical),
        ]);
        let selected: HashSet<String> = ["work".to_string()].into_iter().collect();

        let first = build_feed(&buckets, &selected, today());
        let second = build_feed(&buckets, &selected, today());
        assert_eq!(first.events(), second.events());
        assert_eq!(
            serde_json::to_string(first.events()).unwrap(),
            serde_json::to_string(second.events()).unwrap()
        );
    }
}
