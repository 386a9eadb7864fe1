use anyhow::Result;
use famcal_core::{Category, FamcalConfig, LocalStore, NewLocalEvent, TimeLabel};
use owo_colors::OwoColorize;

use super::parse_date;

pub fn run(
    title: String,
    date: &str,
    time: Option<String>,
    location: Option<String>,
    category: Option<String>,
) -> Result<()> {
    if title.trim().is_empty() {
        anyhow::bail!("Event title must not be empty");
    }

    let date = parse_date(date)?;

    let category = match category {
        Some(name) => {
            let category = Category::from(name.as_str());
            if !category.is_known() {
                let known: Vec<String> = Category::KNOWN.iter().map(|c| c.to_string()).collect();
                anyhow::bail!(
                    "Unknown category '{}'. Use one of: {}",
                    name,
                    known.join(", ")
                );
            }
            Some(category)
        }
        None => None,
    };

    let config = FamcalConfig::load()?;
    let mut store = LocalStore::load(config.local_store_path())?;

    let time = time.map(|t| TimeLabel::from(t.as_str()));
    let label = time.clone().unwrap_or_else(TimeLabel::all_day);

    store.add(NewLocalEvent {
        title: title.clone(),
        date,
        time,
        location: location.filter(|l| !l.trim().is_empty()),
        description: None,
        category,
    });
    store.save()?;

    println!(
        "{} {} {} {}",
        "Created:".green(),
        title.trim().bold(),
        date.format("%a %b %-d, %Y"),
        label.to_string().dimmed()
    );

    Ok(())
}
