use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::calendar::Calendar;
use crate::convert::expand_definitions;
use crate::definition::{EventDefinition, EventTime};
use crate::event::Event;
use crate::expand::ExpandOptions;

/// A Google Calendar event as stored by the calendar-sync backend.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleEventRow {
    pub id: String,
    #[serde(default)]
    pub google_event_id: Option<String>,
    #[serde(default, alias = "summary")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "is_all_day")]
    pub all_day: bool,
}

impl GoogleEventRow {
    /// All-day rows store midnight UTC timestamps; only their dates matter.
    fn to_definition(&self) -> EventDefinition {
        let (start, end) = if self.all_day {
            (
                EventTime::Date(self.start_time.date_naive()),
                self.end_time.map(|t| EventTime::Date(t.date_naive())),
            )
        } else {
            (
                EventTime::DateTimeUtc(self.start_time),
                self.end_time.map(EventTime::DateTimeUtc),
            )
        };

        EventDefinition {
            uid: self.google_event_id.clone().unwrap_or_else(|| self.id.clone()),
            summary: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            organizer: None,
            start,
            end,
            recurrence: None,
            overrides: Vec::new(),
        }
    }
}

/// Convert backend rows; multi-day all-day rows are split per day.
pub fn google_rows_to_events(
    rows: &[GoogleEventRow],
    calendar: &Calendar,
    options: &ExpandOptions,
) -> Vec<Event> {
    let definitions: Vec<EventDefinition> = rows.iter().map(GoogleEventRow::to_definition).collect();
    expand_definitions(&definitions, calendar, options)
}
