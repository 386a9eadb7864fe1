use std::path::Path;

use anyhow::{Context, Result};
use famcal_core::ics::{parse_definitions, validate_ics_payload};
use owo_colors::OwoColorize;

use crate::render::pluralize;

pub fn run(path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    validate_ics_payload(&content)?;
    let definitions = parse_definitions(&content)?;

    let recurring = definitions.iter().filter(|d| d.recurrence.is_some()).count();
    let overrides: usize = definitions.iter().map(|d| d.overrides.len()).sum();

    println!("{} {}", "✓".green(), path.display());
    println!(
        "   {}, {} recurring, {} overridden {}",
        pluralize(definitions.len(), "event"),
        recurring,
        overrides,
        if overrides == 1 { "instance" } else { "instances" }
    );

    Ok(())
}
