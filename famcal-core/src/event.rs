//! Canonical event types.
//!
//! Every source (local store, iCal feeds, Notion databases, calendar-sync
//! backend rows) is normalized into [`Event`]. One `Event` is one concrete
//! occurrence on one calendar day; recurrence and multi-day spans are already
//! expanded by the time an `Event` exists.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Calendar id assigned to events created in the local store.
pub const LOCAL_CALENDAR_ID: &str = "local_calendar";

/// Display name of the local calendar.
pub const LOCAL_CALENDAR_NAME: &str = "Local Calendar";

/// Calendar id assumed by the selection filter when an event carries none.
pub const DEFAULT_CALENDAR_ID: &str = "primary";

/// Title used when a source record has no usable title.
pub const PLACEHOLDER_TITLE: &str = "Untitled Event";

const ALL_DAY: &str = "All day";
const MULTI_DAY: &str = "All day (Multi-day)";
const RECURRING_SUFFIX: &str = " (Recurring)";

/// A single event occurrence (source-neutral).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    pub time: TimeLabel,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub organizer: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub calendar_id: Option<String>,
    #[serde(default)]
    pub calendar_name: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub is_multi_day: bool,
}

impl Event {
    /// The owning calendar id, falling back to [`DEFAULT_CALENDAR_ID`].
    pub fn calendar_id_or_default(&self) -> &str {
        self.calendar_id.as_deref().unwrap_or(DEFAULT_CALENDAR_ID)
    }

    pub fn is_all_day(&self) -> bool {
        self.time.is_all_day()
    }

    /// Whether this event came from the local store.
    ///
    /// Older stored events predate the `source` field and only carry the
    /// local calendar id, so both are checked.
    pub fn is_local(&self) -> bool {
        self.source == Source::Local || self.calendar_id.as_deref() == Some(LOCAL_CALENDAR_ID)
    }

    /// Key under which two events count as duplicates: title, day and time label.
    pub fn dedupe_key(&self) -> (String, NaiveDate, String) {
        (self.title.clone(), self.date, self.time.to_string())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Event identifier. Stored events may carry numeric ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Number(n) => write!(f, "{}", n),
            EventId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId::Text(s)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId::Text(s.to_string())
    }
}

/// Where an event came from. Determines conversion and dedupe precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    #[default]
    Local,
    Ical,
    Notion,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Local => write!(f, "local"),
            Source::Ical => write!(f, "ical"),
            Source::Notion => write!(f, "notion"),
        }
    }
}

/// Event category.
///
/// Categories outside the fixed set are kept as `Other` so stored data
/// survives a round trip, but derived category views ignore them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Personal,
    Work,
    Family,
    Kids,
    Holidays,
    Other(String),
}

impl Category {
    /// The fixed categories, in display order.
    pub const KNOWN: [Category; 5] = [
        Category::Personal,
        Category::Work,
        Category::Family,
        Category::Kids,
        Category::Holidays,
    ];

    pub fn is_known(&self) -> bool {
        !matches!(self, Category::Other(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Family => "family",
            Category::Kids => "kids",
            Category::Holidays => "holidays",
            Category::Other(s) => s,
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.trim().to_lowercase().as_str() {
            "personal" => Category::Personal,
            "work" => Category::Work,
            "family" => Category::Family,
            "kids" => Category::Kids,
            "holidays" | "holiday" => Category::Holidays,
            _ => Category::Other(s),
        }
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The display time of an occurrence.
///
/// Serialized as the plain label string (`"All day"`,
/// `"All day (Multi-day)"`, `"10:00 AM - 11:00 AM"`,
/// `"10:00 AM - 11:00 AM (Recurring)"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeLabel {
    AllDay {
        recurring: bool,
    },
    MultiDay,
    Span {
        start: String,
        end: Option<String>,
        recurring: bool,
    },
}

impl TimeLabel {
    pub fn all_day() -> Self {
        TimeLabel::AllDay { recurring: false }
    }

    pub fn span(start: impl Into<String>, end: impl Into<String>) -> Self {
        TimeLabel::Span {
            start: start.into(),
            end: Some(end.into()),
            recurring: false,
        }
    }

    pub fn is_all_day(&self) -> bool {
        matches!(self, TimeLabel::AllDay { .. } | TimeLabel::MultiDay)
    }

    pub fn is_recurring(&self) -> bool {
        match self {
            TimeLabel::AllDay { recurring } | TimeLabel::Span { recurring, .. } => *recurring,
            TimeLabel::MultiDay => false,
        }
    }

    /// Mark this label as belonging to a recurring series.
    pub fn recurring(self) -> Self {
        match self {
            TimeLabel::AllDay { .. } => TimeLabel::AllDay { recurring: true },
            TimeLabel::MultiDay => TimeLabel::MultiDay,
            TimeLabel::Span { start, end, .. } => TimeLabel::Span {
                start,
                end,
                recurring: true,
            },
        }
    }

    /// Start of a timed label as minutes since midnight.
    ///
    /// Accepts 12-hour (`9:30 AM`, `9:30pm`) and 24-hour (`21:30`) clocks.
    /// Returns `None` for all-day labels and anything unparseable.
    pub fn start_minutes(&self) -> Option<u32> {
        let TimeLabel::Span { start, .. } = self else {
            return None;
        };
        parse_clock(start).map(|t| t.hour() * 60 + t.minute())
    }
}

fn parse_clock(s: &str) -> Option<NaiveTime> {
    let s = s.trim().to_uppercase();
    ["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&s, fmt).ok())
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::AllDay { recurring } => {
                write!(f, "{}", ALL_DAY)?;
                if *recurring {
                    write!(f, "{}", RECURRING_SUFFIX)?;
                }
                Ok(())
            }
            TimeLabel::MultiDay => write!(f, "{}", MULTI_DAY),
            TimeLabel::Span {
                start,
                end,
                recurring,
            } => {
                match end {
                    Some(end) => write!(f, "{} - {}", start, end)?,
                    None => write!(f, "{}", start)?,
                }
                if *recurring {
                    write!(f, "{}", RECURRING_SUFFIX)?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for TimeLabel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == MULTI_DAY {
            return Ok(TimeLabel::MultiDay);
        }

        let (body, recurring) = match s.strip_suffix(RECURRING_SUFFIX) {
            Some(body) => (body, true),
            None => (s, false),
        };

        if body == ALL_DAY || body.is_empty() {
            return Ok(TimeLabel::AllDay { recurring });
        }

        let (start, end) = match body.split_once(" - ") {
            Some((start, end)) => (start.to_string(), Some(end.to_string())),
            None => (body.to_string(), None),
        };

        Ok(TimeLabel::Span {
            start,
            end,
            recurring,
        })
    }
}

impl From<String> for TimeLabel {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(label) => label,
            Err(never) => match never {},
        }
    }
}

impl From<&str> for TimeLabel {
    fn from(s: &str) -> Self {
        TimeLabel::from(s.to_string())
    }
}

impl From<TimeLabel> for String {
    fn from(label: TimeLabel) -> Self {
        label.to_string()
    }
}
