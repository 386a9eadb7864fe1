//! Terminal rendering for famcal types.

use chrono::NaiveDate;
use famcal_core::{Calendar, CalendarOutcome, Category, Event};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for Category {
    fn render(&self) -> String {
        let name = self.as_str();
        match self {
            Category::Personal => name.cyan().to_string(),
            Category::Work => name.blue().to_string(),
            Category::Family => name.magenta().to_string(),
            Category::Kids => name.green().to_string(),
            Category::Holidays => name.red().to_string(),
            Category::Other(_) => name.dimmed().to_string(),
        }
    }
}

impl Render for Event {
    fn render(&self) -> String {
        let time = format!("{:<22}", self.time.to_string());
        let calendar = format!("[{}]", self.calendar_name.as_deref().unwrap_or(self.calendar_id_or_default()));

        let mut line = format!("  {} {} {}", time.dimmed(), self.title.bold(), calendar.dimmed());
        if !self.location.is_empty() {
            line.push_str(&format!(" {}", format!("@ {}", self.location).italic()));
        }
        line
    }
}

impl Render for Calendar {
    fn render(&self) -> String {
        let name = if self.enabled {
            self.name.bold().to_string()
        } else {
            self.name.dimmed().strikethrough().to_string()
        };
        format!("📅 {} {}", name, format!("({})", self.id).dimmed())
    }
}

impl Render for CalendarOutcome {
    fn render(&self) -> String {
        match self {
            CalendarOutcome::Synced { count, at } => format!(
                "{} {} {}",
                "✓".green(),
                pluralize(*count, "event"),
                format!("synced {}", at.format("%H:%M:%S")).dimmed()
            ),
            CalendarOutcome::Failed { error } => format!("{} {}", "✗".red(), error.red()),
        }
    }
}

/// "Today", "Tomorrow", or e.g. "Wed Feb 25"
pub fn date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d, %Y").to_string(),
    }
}

pub fn pluralize(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}
