use anyhow::Result;
use famcal_core::{Category, build_feed};
use owo_colors::OwoColorize;

use super::sync;
use crate::render::Render;

pub async fn run(year: Option<i32>) -> Result<()> {
    let synced = sync(year).await?;
    let feed = build_feed(
        &synced.report.buckets,
        &synced.config.selection(),
        synced.today,
    );

    if feed.is_placeholder() {
        println!("{}\n", "No calendar has events yet. Showing sample events.".yellow());
    }

    let counts = feed.by_source();
    println!("{}", "By source".bold());
    println!("  {:<10} {:>5}", "Local", counts.local);
    println!("  {:<10} {:>5}", "iCal", counts.ical);
    println!("  {:<10} {:>5}", "Notion", counts.notion);
    println!("  {:<10} {:>5}", "Total".bold(), counts.total);

    let by_category = feed.by_category();
    println!();
    println!("{}", "By category".bold());
    for category in Category::KNOWN.iter() {
        let count = by_category.get(category).map_or(0, Vec::len);
        let padding = " ".repeat(10usize.saturating_sub(category.as_str().len()));
        println!("  {}{} {:>5}", category.render(), padding, count);
    }

    Ok(())
}
