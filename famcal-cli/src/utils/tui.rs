use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Spinner on stderr while calendars are fetched. Hidden when stderr isn't
/// a terminal.
pub fn sync_spinner(calendars: usize) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["-", "\\", "|", "/", "✓"])
        .template("{spinner} {msg} {elapsed:.dim}")
    {
        spinner.set_style(style);
    }

    let noun = if calendars == 1 { "calendar" } else { "calendars" };
    spinner.set_message(format!("Syncing {} {}", calendars, noun));
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}
