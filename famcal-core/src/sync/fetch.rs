//! Fetching one calendar's events.

use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use crate::calendar::{Calendar, CalendarSource};
use crate::convert::{
    GoogleEventRow, google_rows_to_events, ical_to_events, notion_to_events, parse_database_id,
};
use crate::error::{FamcalError, FamcalResult};
use crate::event::Event;
use crate::store::LocalStore;
use crate::sync::SyncContext;
use crate::sync::notion_api::query_database;

/// Fetch and convert the events of one calendar, bounded by the context's
/// timeout.
pub async fn fetch_calendar(calendar: &Calendar, ctx: &SyncContext) -> FamcalResult<Vec<Event>> {
    let events = with_timeout(ctx.timeout, fetch_events(calendar, ctx)).await?;
    debug!(calendar = %calendar.id, count = events.len(), "Fetched calendar");
    Ok(events)
}

pub(crate) async fn with_timeout<T>(
    limit: Duration,
    fut: impl Future<Output = FamcalResult<T>>,
) -> FamcalResult<T> {
    timeout(limit, fut)
        .await
        .map_err(|_| FamcalError::FetchTimeout(limit.as_secs()))?
}

async fn fetch_events(calendar: &Calendar, ctx: &SyncContext) -> FamcalResult<Vec<Event>> {
    match &calendar.source {
        CalendarSource::Local => {
            let store = LocalStore::load_async(&ctx.local_store).await?;
            Ok(store.events(calendar, ctx.options.tz))
        }
        CalendarSource::Ical { url } => {
            let content = fetch_text(&ctx.client, url).await?;
            ical_to_events(&content, calendar, &ctx.options)
        }
        CalendarSource::Google { rows } => {
            let content = fetch_text(&ctx.client, rows).await?;
            let rows: Vec<GoogleEventRow> = serde_json::from_str(&content)
                .map_err(|e| FamcalError::Serialization(format!("Google rows: {e}")))?;
            Ok(google_rows_to_events(&rows, calendar, &ctx.options))
        }
        CalendarSource::Notion {
            database,
            token_env,
        } => {
            let database_id = parse_database_id(database)?;
            let token = std::env::var(token_env).map_err(|_| {
                FamcalError::Config(format!("Notion token variable {} is not set", token_env))
            })?;
            let pages = query_database(&ctx.client, &database_id, &token).await?;
            Ok(notion_to_events(&pages, calendar, &ctx.options))
        }
    }
}

/// `webcal://` feeds are plain HTTPS.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    match url.strip_prefix("webcal://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

/// Read a feed from an http(s)/webcal URL or a filesystem path.
pub async fn fetch_text(client: &reqwest::Client, location: &str) -> FamcalResult<String> {
    let location = normalize_url(location);

    if location.starts_with("http://") || location.starts_with("https://") {
        let response = client
            .get(&location)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| FamcalError::Fetch(format!("{}: {}", location, e)))?;

        return response
            .text()
            .await
            .map_err(|e| FamcalError::Fetch(format!("{}: {}", location, e)));
    }

    let path = shellexpand::tilde(&location).into_owned();
    Ok(tokio::fs::read_to_string(&path).await?)
}
