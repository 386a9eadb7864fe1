//! Persisted local events.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::calendar::Calendar;
use crate::convert::{StoredEvent, local_to_event};
use crate::error::{FamcalError, FamcalResult};
use crate::event::{
    Category, Event, EventId, LOCAL_CALENDAR_ID, LOCAL_CALENDAR_NAME, Source, TimeLabel,
};

const STORE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreBlob {
    version: u32,
    #[serde(default)]
    events: Vec<StoredEvent>,
}

/// Input for a new local event.
#[derive(Debug, Clone)]
pub struct NewLocalEvent {
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<TimeLabel>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
}

/// JSON file holding the user's local events.
#[derive(Debug)]
pub struct LocalStore {
    path: PathBuf,
    events: Vec<StoredEvent>,
}

impl LocalStore {
    /// Load the store at `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> FamcalResult<LocalStore> {
        let path = path.into();

        if !path.exists() {
            return Ok(LocalStore {
                path,
                events: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(&path)?;
        LocalStore::parse(path, &content)
    }

    /// Async variant of [`LocalStore::load`] for the sync pass.
    pub async fn load_async(path: impl Into<PathBuf>) -> FamcalResult<LocalStore> {
        let path = path.into();

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => LocalStore::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LocalStore {
                path,
                events: Vec::new(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, content: &str) -> FamcalResult<LocalStore> {
        let path = path.into();

        if content.trim().is_empty() {
            return Ok(LocalStore {
                path,
                events: Vec::new(),
            });
        }

        let blob: StoreBlob = serde_json::from_str(content).map_err(|e| {
            FamcalError::Serialization(format!("{}: {}", path.display(), e))
        })?;

        if blob.version != STORE_VERSION {
            return Err(FamcalError::Validation(format!(
                "Unsupported local store version {} in {}",
                blob.version,
                path.display()
            )));
        }

        Ok(LocalStore {
            path,
            events: blob.events,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[StoredEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Rehydrated events. Records with unreadable dates are skipped.
    pub fn events(&self, calendar: &Calendar, tz: Tz) -> Vec<Event> {
        self.events
            .iter()
            .filter_map(|record| match local_to_event(record, calendar, tz) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(id = %record.id, error = %e, "Skipping local event");
                    None
                }
            })
            .collect()
    }

    /// Append a new event and return its id.
    pub fn add(&mut self, new: NewLocalEvent) -> EventId {
        let id = EventId::Text(Uuid::new_v4().to_string());

        self.events.push(StoredEvent {
            id: id.clone(),
            title: new.title.trim().to_string(),
            date: new.date.format("%Y-%m-%d").to_string(),
            time: Some(new.time.unwrap_or_else(TimeLabel::all_day).to_string()),
            location: new.location,
            description: new.description,
            organizer: None,
            category: new.category,
            color: None,
            calendar_id: Some(LOCAL_CALENDAR_ID.to_string()),
            calendar_name: Some(LOCAL_CALENDAR_NAME.to_string()),
            source: Some(Source::Local),
            is_multi_day: false,
        });

        id
    }

    /// Write the store, replacing the file atomically.
    pub fn save(&self) -> FamcalResult<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }

        let blob = StoreBlob {
            version: STORE_VERSION,
            events: self.events.clone(),
        };
        let content = serde_json::to_string_pretty(&blob)
            .map_err(|e| FamcalError::Serialization(e.to_string()))?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");

        std::fs::write(&temp, content)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::load(dir.path().join("events.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("events.json");

        let mut store = LocalStore::load(&path).unwrap();
        let id = store.add(NewLocalEvent {
            title: "  Piano lesson ".into(),
            date: day(2025, 4, 2),
            time: Some(TimeLabel::span("4:00 PM", "4:45 PM")),
            location: Some("Music school".into()),
            description: None,
            category: Some(Category::Kids),
        });
        store.save().unwrap();

        let reloaded = LocalStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert!(Uuid::parse_str(&id.to_string()).is_ok());

        let events = reloaded.events(&Calendar::local(), chrono_tz::UTC);
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.id, id);
        assert_eq!(event.title, "Piano lesson");
        assert_eq!(event.date, day(2025, 4, 2));
        assert_eq!(event.time.to_string(), "4:00 PM - 4:45 PM");
        assert_eq!(event.category, Category::Kids);
        assert_eq!(event.source, Source::Local);
        assert!(event.is_local());
    }

    #[test]
    fn test_add_generates_distinct_ids() {
        let dir = TempDir::new().unwrap();
        let mut store = LocalStore::load(dir.path().join("events.json")).unwrap();
        let new = NewLocalEvent {
            title: "Walk".into(),
            date: day(2025, 4, 2),
            time: None,
            location: None,
            description: None,
            category: None,
        };

        let a = store.add(new.clone());
        let b = store.add(new);
        assert_ne!(a, b);
    }

    #[test]
    fn test_rehydrates_timestamps_in_timezone() {
        let content = r#"{
            "version": 1,
            "events": [
                { "id": 1, "title": "Late call", "date": "2025-03-10T23:30:00Z" },
                { "id": 2, "title": "Broken", "date": "next tuesday" },
                { "id": "abc", "title": "Plain", "date": "2025-03-12", "time": "All day" }
            ]
        }"#;
        let store = LocalStore::parse("events.json", content).unwrap();

        let events = store.events(&Calendar::local(), chrono_tz::Asia::Tokyo);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].date, day(2025, 3, 11));
        assert_eq!(events[0].id, EventId::Number(1));
        assert_eq!(events[1].date, day(2025, 3, 12));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let err = LocalStore::parse("events.json", r#"{ "version": 2, "events": [] }"#)
            .unwrap_err();
        assert!(matches!(err, FamcalError::Validation(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = LocalStore::parse("events.json", "{ not json").unwrap_err();
        assert!(matches!(err, FamcalError::Serialization(_)));
    }

    #[test]
    fn test_configured_local_calendar_reaches_feed() {
        use crate::calendar::summarize_calendars;
        use crate::config::FamcalConfig;
        use crate::pipeline::{SourceBuckets, build_feed};

        let config = FamcalConfig::from_toml_str(
            r#"
[[calendars]]
id = "home"
name = "Home"
source = { kind = "local" }
"#,
        )
        .unwrap();
        let calendars = config.calendars();
        assert_eq!(calendars.len(), 1);
        assert_eq!(calendars[0].id, "home");
        let selection = config.selection();
        assert!(selection.contains("home"));

        let dir = TempDir::new().unwrap();
        let mut store = LocalStore::load(dir.path().join("events.json")).unwrap();
        store.add(NewLocalEvent {
            title: "Grandma visits".into(),
            date: day(2025, 5, 3),
            time: None,
            location: None,
            description: None,
            category: None,
        });

        let mut buckets = SourceBuckets::default();
        buckets.extend(store.events(&calendars[0], chrono_tz::UTC));
        let feed = build_feed(&buckets, &selection, day(2025, 5, 1));

        assert_eq!(feed.events().len(), 1);
        assert_eq!(feed.events()[0].calendar_id.as_deref(), Some("home"));
        assert_eq!(feed.events()[0].calendar_name.as_deref(), Some("Home"));

        let summaries = summarize_calendars(&calendars, feed.events());
        assert_eq!(summaries[0].event_count, 1);
    }

    #[tokio::test]
    async fn test_load_async_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::load_async(dir.path().join("none.json"))
            .await
            .unwrap();
        assert!(store.is_empty());
    }
}
