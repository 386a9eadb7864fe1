//! Event definitions: source records before expansion.
//!
//! A definition may carry a recurrence rule or span several days. The
//! expander turns it into concrete [`crate::Event`] occurrences.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A start or end instant as a source reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    /// Whole day, no time-of-day component.
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    /// Wall-clock time with no zone attached.
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Wall-clock time in `tz`.
    ///
    /// Dates map to local midnight. Floating times are already wall-clock.
    /// Zoned times with an unknown TZID are treated as floating.
    pub fn to_local(&self, tz: Tz) -> NaiveDateTime {
        match self {
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN),
            EventTime::DateTimeUtc(dt) => dt.with_timezone(&tz).naive_local(),
            EventTime::DateTimeFloating(dt) => *dt,
            EventTime::DateTimeZoned { datetime, tzid } => match tzid.parse::<Tz>() {
                Ok(source_tz) => match source_tz.from_local_datetime(datetime).earliest() {
                    Some(zoned) => zoned.with_timezone(&tz).naive_local(),
                    None => *datetime,
                },
                Err(_) => *datetime,
            },
        }
    }

    /// Calendar day in `tz`.
    pub fn local_date(&self, tz: Tz) -> NaiveDate {
        match self {
            EventTime::Date(d) => *d,
            other => other.to_local(tz).date(),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%SZ")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%dT%H:%M:%S"), tzid)
            }
        }
    }
}

/// Recurrence rule plus excluded dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    /// RRULE value without the `RRULE:` prefix, e.g. `FREQ=WEEKLY;BYDAY=MO`.
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

/// A source record before expansion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    /// Stable identifier of the definition (iCal UID, row id, page id).
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    pub start: EventTime,
    pub end: Option<EventTime>,
    pub recurrence: Option<Recurrence>,
    /// Overridden instances of a recurring series, keyed by their original start.
    pub overrides: Vec<InstanceOverride>,
}

impl EventDefinition {
    pub fn new(uid: impl Into<String>, summary: impl Into<String>, start: EventTime) -> Self {
        EventDefinition {
            uid: uid.into(),
            summary: summary.into(),
            description: None,
            location: None,
            organizer: None,
            start,
            end: None,
            recurrence: None,
            overrides: Vec::new(),
        }
    }

    pub fn with_end(mut self, end: EventTime) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_recurrence(mut self, rrule: impl Into<String>) -> Self {
        self.recurrence = Some(Recurrence {
            rrule: rrule.into(),
            exdates: Vec::new(),
        });
        self
    }

    /// Number of whole days covered when both ends are date-only values.
    ///
    /// Returns `None` for timed events or missing end.
    pub fn day_span(&self) -> Option<i64> {
        match (&self.start, &self.end) {
            (EventTime::Date(start), Some(EventTime::Date(end))) => {
                Some((*end - *start).num_days())
            }
            _ => None,
        }
    }

    /// Whether this definition covers more than one calendar day.
    pub fn is_multi_day(&self) -> bool {
        self.day_span().is_some_and(|days| days > 1)
    }
}

/// A single modified instance of a recurring series (iCal RECURRENCE-ID).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceOverride {
    pub recurrence_id: EventTime,
    pub definition: EventDefinition,
}
