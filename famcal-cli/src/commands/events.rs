use std::collections::HashSet;

use anyhow::Result;
use chrono::{Datelike, Days, NaiveDate};
use famcal_core::{Event, build_feed};
use owo_colors::OwoColorize;

use super::{parse_date, sync};
use crate::render::{Render, date_label};

/// Days shown when no range is given, starting today.
const UPCOMING_DAYS: u64 = 7;

/// Which days the `events` command shows.
pub enum DayRange {
    Day(NaiveDate),
    Span {
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    },
    Year(i32),
    Upcoming,
}

impl DayRange {
    pub fn from_args(
        date: Option<&str>,
        from: Option<&str>,
        to: Option<&str>,
        year: Option<i32>,
    ) -> Result<Self> {
        if let Some(date) = date {
            return Ok(DayRange::Day(parse_date(date)?));
        }

        let from = from.map(parse_date).transpose()?;
        let to = to.map(parse_date).transpose()?;

        if let (Some(from), Some(to)) = (from, to)
            && to < from
        {
            anyhow::bail!("--to ({}) is before --from ({})", to, from);
        }

        Ok(match (from, to, year) {
            (None, None, Some(year)) => DayRange::Year(year),
            (None, None, None) => DayRange::Upcoming,
            (from, to, _) => DayRange::Span { from, to },
        })
    }

    /// The year whose occurrences should be expanded, if the range names one.
    fn year(&self) -> Option<i32> {
        match self {
            DayRange::Day(date) => Some(date.year()),
            DayRange::Span { from, to } => from.or(*to).map(|d| d.year()),
            DayRange::Year(year) => Some(*year),
            DayRange::Upcoming => None,
        }
    }

    /// Inclusive bounds; `None` means unbounded on that side.
    fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            DayRange::Day(date) => (Some(*date), Some(*date)),
            DayRange::Span { from, to } => (*from, *to),
            DayRange::Year(year) => (
                NaiveDate::from_ymd_opt(*year, 1, 1),
                NaiveDate::from_ymd_opt(*year, 12, 31),
            ),
            DayRange::Upcoming => (Some(today), today.checked_add_days(Days::new(UPCOMING_DAYS - 1))),
        }
    }
}

pub async fn run(range: DayRange, calendar_ids: Vec<String>, year: Option<i32>) -> Result<()> {
    let synced = sync(year.or(range.year())).await?;

    let selection: HashSet<String> = if calendar_ids.is_empty() {
        synced.config.selection()
    } else {
        let known: HashSet<&str> = synced.calendars.iter().map(|c| c.id.as_str()).collect();
        if let Some(unknown) = calendar_ids.iter().find(|id| !known.contains(id.as_str())) {
            let available: Vec<_> = synced.calendars.iter().map(|c| c.id.clone()).collect();
            anyhow::bail!(
                "Calendar '{}' not found. Available: {}",
                unknown,
                available.join(", ")
            );
        }
        calendar_ids.into_iter().collect()
    };

    let feed = build_feed(&synced.report.buckets, &selection, synced.today);

    if feed.is_placeholder() {
        println!(
            "{}\n",
            "No calendar has events yet. Showing sample events.".yellow()
        );
    }

    let (from, to) = range.bounds(synced.today);
    let events: Vec<&Event> = feed
        .events()
        .iter()
        .filter(|e| from.is_none_or(|from| e.date >= from))
        .filter(|e| to.is_none_or(|to| e.date <= to))
        .collect();

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    let mut current_date: Option<NaiveDate> = None;

    for event in events {
        if current_date != Some(event.date) {
            if current_date.is_some() {
                println!();
            }
            println!("{}", date_label(event.date, synced.today).bold());
            current_date = Some(event.date);
        }

        println!("{}", event.render());
    }

    Ok(())
}
