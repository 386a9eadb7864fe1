pub mod calendars;
pub mod events;
pub mod new;
pub mod stats;
pub mod validate;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use famcal_core::{Calendar, FamcalConfig, SyncContext, SyncReport, sync_calendars};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::utils::tui::sync_spinner;

/// Calendars and the result of syncing them.
pub struct Synced {
    pub config: FamcalConfig,
    pub calendars: Vec<Calendar>,
    pub report: SyncReport,
    /// Today in the configured timezone.
    pub today: NaiveDate,
}

/// Load the config and run one sync pass for `year` (default: this year).
pub async fn sync(year: Option<i32>) -> Result<Synced> {
    let config = FamcalConfig::load()?;
    let today = Utc::now().with_timezone(&config.tz()?).date_naive();
    let year = year.unwrap_or_else(|| today.year());

    let ctx = SyncContext::from_config(&config, year)?;
    let mut calendars = config.calendars();

    let enabled = calendars.iter().filter(|c| c.enabled).count();
    debug!(year, calendars = enabled, "Starting sync");
    let spinner = sync_spinner(enabled);
    let report = sync_calendars(&calendars, &ctx).await;
    spinner.finish_and_clear();

    for (calendar_id, error) in report.failures() {
        eprintln!(
            "{} {}: {}",
            "warning:".yellow().bold(),
            calendar_id,
            error
        );
    }

    report.apply_to(&mut calendars);

    Ok(Synced {
        config,
        calendars,
        report,
        today,
    })
}

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}' (expected YYYY-MM-DD)", value))
}
