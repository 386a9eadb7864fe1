//! Calendar records and derived per-calendar counts.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{Category, Event, LOCAL_CALENDAR_ID, LOCAL_CALENDAR_NAME, Source};

const DEFAULT_COLOR: &str = "blue";
const DEFAULT_TOKEN_ENV: &str = "NOTION_TOKEN";

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

/// A configured calendar: where its events come from and how they display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Category given to events that don't carry their own.
    #[serde(default)]
    pub category: Category,
    pub source: CalendarSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

/// Where a calendar's events are fetched from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalendarSource {
    /// Events kept in the local store.
    Local,
    /// An iCal feed (http(s)/webcal URL or file path).
    Ical { url: String },
    /// A Notion database (id or URL). The API token is read from `token_env`.
    Notion {
        database: String,
        #[serde(default = "default_token_env")]
        token_env: String,
    },
    /// Rows synced by the calendar backend (JSON file path or URL).
    Google { rows: String },
}

impl CalendarSource {
    /// The event source that events of this calendar are tagged with.
    pub fn event_source(&self) -> Source {
        match self {
            CalendarSource::Local => Source::Local,
            CalendarSource::Ical { .. } | CalendarSource::Google { .. } => Source::Ical,
            CalendarSource::Notion { .. } => Source::Notion,
        }
    }
}

impl Calendar {
    /// The built-in calendar that holds locally created events.
    pub fn local() -> Self {
        Calendar {
            id: LOCAL_CALENDAR_ID.to_string(),
            name: LOCAL_CALENDAR_NAME.to_string(),
            color: default_color(),
            enabled: true,
            category: Category::default(),
            source: CalendarSource::Local,
            last_sync: None,
        }
    }

    /// Whether `event` belongs to this calendar.
    pub fn owns(&self, event: &Event) -> bool {
        match self.source {
            CalendarSource::Local => event.is_local(),
            _ => event.calendar_id_or_default() == self.id,
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A calendar together with counts derived from the current event list.
#[derive(Debug, Clone)]
pub struct CalendarSummary<'a> {
    pub calendar: &'a Calendar,
    pub event_count: usize,
    pub has_events: bool,
}

/// Recompute per-calendar counts from `events`.
pub fn summarize_calendars<'a>(
    calendars: &'a [Calendar],
    events: &[Event],
) -> Vec<CalendarSummary<'a>> {
    calendars
        .iter()
        .map(|calendar| {
            let event_count = events.iter().filter(|e| calendar.owns(e)).count();
            CalendarSummary {
                calendar,
                event_count,
                has_events: event_count > 0,
            }
        })
        .collect()
}

/// Ids of every enabled calendar.
pub fn default_selection(calendars: &[Calendar]) -> HashSet<String> {
    calendars
        .iter()
        .filter(|c| c.enabled)
        .map(|c| c.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventId, TimeLabel};
    use chrono::NaiveDate;

    fn event(calendar_id: Option<&str>, source: Source) -> Event {
        Event {
            id: EventId::from("e"),
            title: "Event".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: TimeLabel::all_day(),
            location: String::new(),
            description: String::new(),
            organizer: String::new(),
            category: Category::Personal,
            color: String::new(),
            calendar_id: calendar_id.map(String::from),
            calendar_name: None,
            source,
            is_multi_day: false,
        }
    }

    fn feed(id: &str) -> Calendar {
        Calendar {
            id: id.to_string(),
            name: id.to_string(),
            color: default_color(),
            enabled: true,
            category: Category::Work,
            source: CalendarSource::Ical {
                url: "https://example.com/cal.ics".to_string(),
            },
            last_sync: None,
        }
    }

    #[test]
    fn test_summaries_follow_event_list() {
        let calendars = vec![Calendar::local(), feed("school"), feed("empty")];
        let events = vec![
            event(Some("school"), Source::Ical),
            event(Some("school"), Source::Ical),
            // Legacy local event without a calendar id
            event(None, Source::Local),
        ];

        let summaries = summarize_calendars(&calendars, &events);
        let counts: Vec<_> = summaries
            .iter()
            .map(|s| (s.calendar.id.as_str(), s.event_count, s.has_events))
            .collect();

        assert_eq!(
            counts,
            vec![
                (LOCAL_CALENDAR_ID, 1, true),
                ("school", 2, true),
                ("empty", 0, false),
            ]
        );

        let summaries = summarize_calendars(&calendars, &[]);
        assert!(summaries.iter().all(|s| !s.has_events));
    }

    #[test]
    fn test_default_selection_skips_disabled() {
        let mut disabled = feed("old");
        disabled.enabled = false;
        let calendars = vec![Calendar::local(), disabled];

        let selection = default_selection(&calendars);
        assert!(selection.contains(LOCAL_CALENDAR_ID));
        assert!(!selection.contains("old"));
    }

    #[test]
    fn test_source_config_from_toml() {
        let toml_str = r#"
            id = "family"
            name = "Family"
            source = { kind = "notion", database = "https://www.notion.so/abc" }
        "#;
        let calendar: Calendar = toml::from_str(toml_str).expect("Should parse");
        assert!(calendar.enabled);
        assert_eq!(calendar.color, "blue");
        assert_eq!(
            calendar.source,
            CalendarSource::Notion {
                database: "https://www.notion.so/abc".to_string(),
                token_env: "NOTION_TOKEN".to_string(),
            }
        );
    }
}
