//! Notion database query client.

use serde::Deserialize;
use serde_json::json;

use crate::convert::NotionPage;
use crate::error::{FamcalError, FamcalResult};

const NOTION_API_URL: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<NotionPage>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Fetch every page of a database, following `next_cursor`.
///
/// `database_id` must already be validated with
/// [`crate::convert::parse_database_id`].
pub async fn query_database(
    client: &reqwest::Client,
    database_id: &str,
    token: &str,
) -> FamcalResult<Vec<NotionPage>> {
    let url = format!("{}/databases/{}/query", NOTION_API_URL, database_id);
    let mut pages = Vec::new();
    let mut cursor: Option<String> = None;

    loop {
        let mut body = json!({ "page_size": PAGE_SIZE });
        if let Some(cursor) = &cursor {
            body["start_cursor"] = json!(cursor);
        }

        let response = client
            .post(&url)
            .bearer_auth(token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| FamcalError::Fetch(format!("Notion request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FamcalError::Fetch(format!(
                "Notion returned {}: {}",
                status,
                detail.trim()
            )));
        }

        let page: QueryResponse = response
            .json()
            .await
            .map_err(|e| FamcalError::Serialization(format!("Notion response: {e}")))?;

        pages.extend(page.results);

        match (page.has_more, page.next_cursor) {
            (true, Some(next)) => cursor = Some(next),
            _ => break,
        }
    }

    Ok(pages)
}
