//! Sync pass: fetch every enabled calendar concurrently and bucket the
//! results by source.
//!
//! Fetches settle independently. A calendar that fails or times out is
//! reported in its [`CalendarOutcome`] and contributes no events; the rest
//! of the pass carries on.

mod fetch;
mod notion_api;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::calendar::Calendar;
use crate::config::FamcalConfig;
use crate::error::{FamcalError, FamcalResult};
use crate::expand::ExpandOptions;
use crate::pipeline::SourceBuckets;

pub use fetch::{fetch_calendar, fetch_text, normalize_url};
pub use notion_api::query_database;

/// Shared state for one sync pass.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub client: reqwest::Client,
    pub options: ExpandOptions,
    /// Upper bound for a single calendar's fetch.
    pub timeout: Duration,
    pub local_store: PathBuf,
}

impl SyncContext {
    pub fn new(
        client: reqwest::Client,
        options: ExpandOptions,
        timeout: Duration,
        local_store: PathBuf,
    ) -> Self {
        SyncContext {
            client,
            options,
            timeout,
            local_store,
        }
    }

    /// Context for expanding `year` with the configured timezone and limits.
    pub fn from_config(config: &FamcalConfig, year: i32) -> FamcalResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("famcal/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FamcalError::Fetch(e.to_string()))?;

        let mut options = ExpandOptions::new(year, config.tz()?);
        options.time_format = config.time_format;

        Ok(SyncContext::new(
            client,
            options,
            Duration::from_secs(config.fetch_timeout_secs),
            config.local_store_path(),
        ))
    }

    #[cfg(test)]
    pub(crate) fn for_tests(year: i32, local_store: PathBuf) -> Self {
        SyncContext::new(
            reqwest::Client::new(),
            ExpandOptions::new(year, chrono_tz::UTC),
            Duration::from_secs(5),
            local_store,
        )
    }
}

/// How one calendar's fetch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarOutcome {
    Synced { count: usize, at: DateTime<Utc> },
    Failed { error: String },
}

#[derive(Debug, Clone)]
pub struct CalendarSync {
    pub calendar_id: String,
    pub outcome: CalendarOutcome,
}

/// Result of a sync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub buckets: SourceBuckets,
    pub calendars: Vec<CalendarSync>,
}

impl SyncReport {
    pub fn outcome(&self, calendar_id: &str) -> Option<&CalendarOutcome> {
        self.calendars
            .iter()
            .find(|c| c.calendar_id == calendar_id)
            .map(|c| &c.outcome)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.calendars.iter().filter_map(|c| match &c.outcome {
            CalendarOutcome::Failed { error } => Some((c.calendar_id.as_str(), error.as_str())),
            CalendarOutcome::Synced { .. } => None,
        })
    }

    /// Record successful sync times on the matching calendars.
    pub fn apply_to(&self, calendars: &mut [Calendar]) {
        for calendar in calendars.iter_mut() {
            if let Some(CalendarOutcome::Synced { at, .. }) = self.outcome(&calendar.id) {
                calendar.last_sync = Some(*at);
            }
        }
    }
}

/// Fetch all enabled calendars concurrently.
pub async fn sync_calendars(calendars: &[Calendar], ctx: &SyncContext) -> SyncReport {
    let enabled: Vec<&Calendar> = calendars.iter().filter(|c| c.enabled).collect();

    let results =
        futures::future::join_all(enabled.iter().map(|calendar| fetch_calendar(calendar, ctx)))
            .await;

    let mut report = SyncReport::default();

    for (calendar, result) in enabled.into_iter().zip(results) {
        let outcome = match result {
            Ok(events) => {
                let count = events.len();
                report.buckets.extend(events);
                CalendarOutcome::Synced {
                    count,
                    at: Utc::now(),
                }
            }
            Err(e) => {
                warn!(calendar = %calendar.id, error = %e, "Calendar sync failed");
                CalendarOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        report.calendars.push(CalendarSync {
            calendar_id: calendar.id.clone(),
            outcome,
        });
    }

    report
}
