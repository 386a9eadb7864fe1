//! Core of famcal: turns local, iCal, Notion and Google calendar data into
//! one ordered, de-duplicated event stream.
//!
//! - `expand` turns event definitions into per-day occurrences
//! - `convert` normalizes each source's records into [`Event`]s
//! - `aggregate`, `filter` and `views` merge, select and summarize
//! - `sync` fetches every configured calendar concurrently

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod convert;
pub mod definition;
pub mod error;
pub mod event;
pub mod expand;
pub mod filter;
pub mod ics;
pub mod identity;
pub mod pipeline;
pub mod store;
pub mod sync;
pub mod views;

pub use aggregate::{aggregate, compare_events, sort_events};
pub use calendar::{Calendar, CalendarSource, CalendarSummary, default_selection, summarize_calendars};
pub use config::FamcalConfig;
pub use definition::{EventDefinition, EventTime, InstanceOverride, Recurrence};
pub use error::{FamcalError, FamcalResult};
pub use event::*;
pub use expand::{ExpandOptions, Expansion, MAX_OCCURRENCES, TimeFormat, expand};
pub use filter::{FeedState, filter_by_selection};
pub use identity::{has_changed, occurrence_id};
pub use pipeline::{Feed, SourceBuckets, build_feed, sample_events};
pub use store::{LocalStore, NewLocalEvent};
pub use sync::{CalendarOutcome, CalendarSync, SyncContext, SyncReport, sync_calendars};
pub use views::{SourceCounts, events_by_category, events_by_source, events_for_date, has_events_on};
