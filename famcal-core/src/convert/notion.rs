//! Notion database pages.
//!
//! Notion databases have user-defined column names, so fields are located by
//! ranked predicates over the property map rather than fixed keys.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::definition::{EventDefinition, EventTime};
use crate::error::{FamcalError, FamcalResult};
use crate::event::{Category, Event};
use crate::expand::{ExpandOptions, build_occurrence, time_label};

/// A page returned by a Notion database query.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// One way to recognize the property that holds a field.
#[derive(Debug, Clone, Copy)]
enum Candidate {
    /// Property name contains this text (case-insensitive).
    NameContains(&'static str),
    /// Property has this Notion type.
    Type(&'static str),
}

impl Candidate {
    fn matches(&self, name: &str, value: &Value) -> bool {
        match self {
            Candidate::NameContains(needle) => name.to_lowercase().contains(needle),
            Candidate::Type(kind) => property_type(value) == Some(*kind),
        }
    }
}

const TITLE: &[Candidate] = &[
    Candidate::NameContains("title"),
    Candidate::NameContains("name"),
    Candidate::Type("title"),
];
const DATE: &[Candidate] = &[
    Candidate::NameContains("date"),
    Candidate::NameContains("time"),
    Candidate::NameContains("when"),
    Candidate::Type("date"),
];
const DESCRIPTION: &[Candidate] = &[
    Candidate::NameContains("description"),
    Candidate::NameContains("notes"),
    Candidate::NameContains("details"),
];
const LOCATION: &[Candidate] = &[
    Candidate::NameContains("location"),
    Candidate::NameContains("place"),
    Candidate::NameContains("where"),
];
const CATEGORY: &[Candidate] = &[
    Candidate::NameContains("category"),
    Candidate::NameContains("type"),
    Candidate::NameContains("tag"),
];

/// First value produced by `extract` for a property matching the candidates,
/// trying candidates in rank order.
fn find_field<T>(
    properties: &Map<String, Value>,
    candidates: &[Candidate],
    extract: impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    candidates.iter().find_map(|candidate| {
        properties
            .iter()
            .filter(|(name, value)| candidate.matches(name, value))
            .find_map(|(_, value)| extract(value))
    })
}

fn property_type(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

fn rich_text(items: &Value) -> Option<String> {
    let text: String = items
        .as_array()?
        .iter()
        .filter_map(|item| item.get("plain_text").and_then(Value::as_str))
        .collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Plain text of a property, whatever its type.
fn text_value(value: &Value) -> Option<String> {
    let kind = property_type(value)?;
    let inner = value.get(kind)?;
    match kind {
        "title" | "rich_text" => rich_text(inner),
        "select" | "status" => inner.get("name").and_then(Value::as_str).map(String::from),
        "multi_select" => inner
            .as_array()?
            .first()?
            .get("name")
            .and_then(Value::as_str)
            .map(String::from),
        "url" | "email" | "phone_number" => inner.as_str().map(String::from),
        "number" => inner.as_f64().map(|n| n.to_string()),
        "formula" => inner.get("string").and_then(Value::as_str).map(String::from),
        _ => None,
    }
    .filter(|s| !s.trim().is_empty())
}

/// Start and optional end of a date-like property.
fn date_value(value: &Value) -> Option<(EventTime, Option<EventTime>)> {
    let kind = property_type(value)?;
    let inner = value.get(kind)?;
    match kind {
        "date" => {
            let start = parse_notion_date(inner.get("start")?.as_str()?)?;
            let end = inner
                .get("end")
                .and_then(Value::as_str)
                .and_then(parse_notion_date);
            Some((start, end))
        }
        "formula" => {
            let date = inner.get("date")?;
            Some((parse_notion_date(date.get("start")?.as_str()?)?, None))
        }
        "created_time" | "last_edited_time" => Some((parse_notion_date(inner.as_str()?)?, None)),
        _ => None,
    }
}

/// Notion dates are `YYYY-MM-DD` or RFC 3339 timestamps.
fn parse_notion_date(value: &str) -> Option<EventTime> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(EventTime::Date(date));
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| EventTime::DateTimeUtc(dt.to_utc()))
}

/// Convert one page. Returns `None` if the page has neither a recognizable
/// title nor date, or no date can be resolved at all.
pub fn notion_to_event(page: &NotionPage, calendar: &Calendar, options: &ExpandOptions) -> Option<Event> {
    let properties = &page.properties;

    let title = find_field(properties, TITLE, text_value);
    let date = find_field(properties, DATE, date_value);

    if title.is_none() && date.is_none() {
        warn!(page = %page.id, "Skipping Notion page without title or date");
        return None;
    }

    // Pages without a date column show on the day they were created
    let (start, end) = match date {
        Some(found) => found,
        None => {
            let created = page.created_time.as_deref().and_then(parse_notion_date);
            let Some(created) = created else {
                warn!(page = %page.id, "Skipping Notion page without a resolvable date");
                return None;
            };
            (EventTime::Date(created.local_date(options.tz)), None)
        }
    };

    let definition = EventDefinition {
        uid: page.id.clone(),
        summary: title.unwrap_or_default(),
        description: find_field(properties, DESCRIPTION, text_value),
        location: find_field(properties, LOCATION, text_value),
        organizer: None,
        start,
        end,
        recurrence: None,
        overrides: Vec::new(),
    };

    let date = definition.start.local_date(options.tz);
    let time = time_label(&definition.start, definition.end.as_ref(), options);
    let mut event = build_occurrence(&definition, calendar, date, time, false);

    if let Some(category) = find_field(properties, CATEGORY, text_value) {
        let category = Category::from(category);
        if category.is_known() {
            event.category = category;
        }
    }

    Some(event)
}

pub fn notion_to_events(pages: &[NotionPage], calendar: &Calendar, options: &ExpandOptions) -> Vec<Event> {
    pages
        .iter()
        .filter_map(|page| notion_to_event(page, calendar, options))
        .collect()
}

/// Extract a database id from a raw id or a Notion URL.
///
/// Accepts 32 hex digits with or without dashes, optionally at the end of a
/// URL path segment (`https://www.notion.so/team/Family-0123...cdef?v=...`).
pub fn parse_database_id(input: &str) -> FamcalResult<String> {
    let invalid = || {
        FamcalError::Validation(format!(
            "'{}' is not a Notion database id or URL",
            input.trim()
        ))
    };

    let path = input.trim().split(['?', '#']).next().unwrap_or_default();
    let segment = path.trim_end_matches('/').rsplit('/').next().ok_or_else(invalid)?;

    let compact: Vec<char> = segment.chars().filter(|c| *c != '-').collect();
    if compact.len() < 32 {
        return Err(invalid());
    }
    let tail: String = compact[compact.len() - 32..].iter().collect();

    Uuid::try_parse(&tail)
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| invalid())
}
