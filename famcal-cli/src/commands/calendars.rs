use anyhow::Result;
use famcal_core::{aggregate, summarize_calendars};
use owo_colors::OwoColorize;

use super::sync;
use crate::render::{Render, pluralize};

pub async fn run(year: Option<i32>) -> Result<()> {
    let synced = sync(year).await?;
    let buckets = &synced.report.buckets;

    // Counts cover every synced event, not just the selected calendars
    let events = aggregate(&buckets.local, &buckets.ical, &buckets.notion);
    let selection = synced.config.selection();

    for (i, summary) in summarize_calendars(&synced.calendars, &events)
        .iter()
        .enumerate()
    {
        let calendar = summary.calendar;
        let marker = if selection.contains(&calendar.id) {
            "●".green().to_string()
        } else {
            "○".dimmed().to_string()
        };

        println!("{} {}", marker, calendar.render());
        println!(
            "   {} {}",
            pluralize(summary.event_count, "event"),
            calendar.category.render()
        );

        match synced.report.outcome(&calendar.id) {
            Some(outcome) => println!("   {}", outcome.render()),
            None => println!("   {}", "disabled".dimmed()),
        }

        if i + 1 < synced.calendars.len() {
            println!();
        }
    }

    Ok(())
}
