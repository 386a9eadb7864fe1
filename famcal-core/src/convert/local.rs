use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::error::{FamcalError, FamcalResult};
use crate::event::{
    Category, Event, EventId, LOCAL_CALENDAR_ID, LOCAL_CALENDAR_NAME, PLACEHOLDER_TITLE, Source,
    TimeLabel,
};

/// A local event as persisted in the store, with its date as an ISO string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub id: EventId,
    #[serde(default)]
    pub title: String,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,
    #[serde(default)]
    pub is_multi_day: bool,
}

impl From<&Event> for StoredEvent {
    fn from(event: &Event) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        StoredEvent {
            id: event.id.clone(),
            title: event.title.clone(),
            date: event.date.format("%Y-%m-%d").to_string(),
            time: Some(event.time.to_string()),
            location: non_empty(&event.location),
            description: non_empty(&event.description),
            organizer: non_empty(&event.organizer),
            category: Some(event.category.clone()),
            color: non_empty(&event.color),
            calendar_id: event.calendar_id.clone(),
            calendar_name: event.calendar_name.clone(),
            source: Some(event.source),
            is_multi_day: event.is_multi_day,
        }
    }
}

/// Turn a stored ISO date string back into a calendar day.
///
/// `YYYY-MM-DD` is taken as-is. Full timestamps (as written by older
/// clients) are converted to the wall-clock day in `tz`.
pub fn rehydrate_date(value: &str, tz: Tz) -> FamcalResult<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| FamcalError::Validation(format!("Invalid stored date '{}'", value)))
}

/// Convert a stored local event, filling in local-calendar defaults.
pub fn local_to_event(record: &StoredEvent, calendar: &Calendar, tz: Tz) -> FamcalResult<Event> {
    let date = rehydrate_date(&record.date, tz)?;
    let trimmed = |s: &Option<String>| s.as_deref().map(str::trim).unwrap_or_default().to_string();

    let title = record.title.trim();

    // Records without a calendar, or with the built-in id, belong to the
    // local calendar they were loaded for
    let (calendar_id, calendar_name) = match record.calendar_id.as_deref() {
        None | Some(LOCAL_CALENDAR_ID) => (calendar.id.as_str(), calendar.name.clone()),
        Some(id) => (
            id,
            record
                .calendar_name
                .clone()
                .unwrap_or_else(|| LOCAL_CALENDAR_NAME.to_string()),
        ),
    };

    Ok(Event {
        id: record.id.clone(),
        title: if title.is_empty() {
            PLACEHOLDER_TITLE.to_string()
        } else {
            title.to_string()
        },
        date,
        time: record
            .time
            .as_deref()
            .map(TimeLabel::from)
            .unwrap_or_else(TimeLabel::all_day),
        location: trimmed(&record.location),
        description: trimmed(&record.description),
        organizer: trimmed(&record.organizer),
        category: record
            .category
            .clone()
            .unwrap_or_else(|| calendar.category.clone()),
        color: record.color.clone().unwrap_or_else(|| calendar.color.clone()),
        calendar_id: Some(calendar_id.to_string()),
        calendar_name: Some(calendar_name),
        source: record.source.unwrap_or(Source::Local),
        is_multi_day: record.is_multi_day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str) -> StoredEvent {
        StoredEvent {
            id: EventId::Number(7),
            title: "  Piano lesson ".to_string(),
            date: date.to_string(),
            time: Some("4:00 PM - 5:00 PM".to_string()),
            location: None,
            description: Some(" Bring sheet music ".to_string()),
            organizer: None,
            category: None,
            color: None,
            calendar_id: None,
            calendar_name: None,
            source: None,
            is_multi_day: false,
        }
    }

    #[test]
    fn test_rehydrate_plain_date() {
        let date = rehydrate_date("2025-03-10", Tz::UTC).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn test_rehydrate_timestamp_uses_wall_clock() {
        // Midnight in Oslo serialized as UTC
        let oslo: Tz = "Europe/Oslo".parse().unwrap();
        let date = rehydrate_date("2025-03-09T23:00:00.000Z", oslo).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
    }

    #[test]
    fn test_rehydrate_rejects_garbage() {
        assert!(matches!(
            rehydrate_date("next tuesday", Tz::UTC),
            Err(FamcalError::Validation(_))
        ));
    }

    #[test]
    fn test_local_defaults() {
        let event = local_to_event(&record("2025-03-10"), &Calendar::local(), Tz::UTC).unwrap();

        assert_eq!(event.title, "Piano lesson");
        assert_eq!(event.description, "Bring sheet music");
        assert_eq!(event.source, Source::Local);
        assert_eq!(event.calendar_id.as_deref(), Some(LOCAL_CALENDAR_ID));
        assert_eq!(event.calendar_name.as_deref(), Some(LOCAL_CALENDAR_NAME));
        assert_eq!(event.category, Category::Personal);
        assert_eq!(event.time.start_minutes(), Some(16 * 60));
    }

    #[test]
    fn test_configured_local_calendar_owns_records() {
        let home = Calendar {
            id: "home".to_string(),
            name: "Home".to_string(),
            ..Calendar::local()
        };

        let mut legacy = record("2025-03-10");
        legacy.calendar_id = Some(LOCAL_CALENDAR_ID.to_string());
        legacy.calendar_name = Some(LOCAL_CALENDAR_NAME.to_string());

        for stored in [record("2025-03-10"), legacy] {
            let event = local_to_event(&stored, &home, Tz::UTC).unwrap();
            assert_eq!(event.calendar_id.as_deref(), Some("home"));
            assert_eq!(event.calendar_name.as_deref(), Some("Home"));
            assert!(event.is_local());
        }

        let mut other = record("2025-03-10");
        other.calendar_id = Some("garden".to_string());
        let event = local_to_event(&other, &home, Tz::UTC).unwrap();
        assert_eq!(event.calendar_id.as_deref(), Some("garden"));
    }

    #[test]
    fn test_stored_round_trip_keeps_fields() {
        let event = local_to_event(&record("2025-03-10"), &Calendar::local(), Tz::UTC).unwrap();
        let stored = StoredEvent::from(&event);
        let again = local_to_event(&stored, &Calendar::local(), Tz::UTC).unwrap();
        assert_eq!(event, again);
    }
}
