mod commands;
mod render;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "famcal")]
#[command(about = "One calendar for the whole family, merged from local, iCal, Notion and Google sources")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show events grouped by day
    Events {
        /// Only this day (YYYY-MM-DD)
        #[arg(short, long, conflicts_with_all = ["from", "to"])]
        date: Option<String>,

        /// Show events from this date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Show events until this date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only these calendars (by id), instead of the configured selection
        #[arg(short, long)]
        calendar: Vec<String>,

        /// Year to expand recurring events in (defaults to the year shown)
        #[arg(long)]
        year: Option<i32>,
    },
    /// List calendars with event counts and sync results
    Calendars {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Event counts per source and category
    Stats {
        #[arg(long)]
        year: Option<i32>,
    },
    /// Check that a file is a usable iCal feed
    Validate { path: PathBuf },
    /// Add an event to the local calendar
    New {
        title: String,

        /// Day of the event (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Time label, e.g. "4:00 PM - 5:00 PM" (defaults to all day)
        #[arg(short, long)]
        time: Option<String>,

        #[arg(short, long)]
        location: Option<String>,

        /// Personal, Work, Family, Kids or Holidays
        #[arg(long)]
        category: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("famcal=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Events {
            date,
            from,
            to,
            calendar,
            year,
        } => {
            let range = commands::events::DayRange::from_args(
                date.as_deref(),
                from.as_deref(),
                to.as_deref(),
                year,
            )?;
            commands::events::run(range, calendar, year).await
        }
        Commands::Calendars { year } => commands::calendars::run(year).await,
        Commands::Stats { year } => commands::stats::run(year).await,
        Commands::Validate { path } => commands::validate::run(&path),
        Commands::New {
            title,
            date,
            time,
            location,
            category,
        } => commands::new::run(title, &date, time, location, category),
    }
}
