use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::Config;
use crate::parser::page_id;
use crate::store::Store;

const CONCURRENCY: usize = 4;
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 2000;

pub struct FetchStats {
    pub total: usize,
    pub ok: usize,
    pub errors: usize,
}

struct FetchRow {
    id: String,
    title: String,
    markup: Option<String>,
    error: Option<String>,
}

/// Fetch raw markup for every configured page not yet on disk,
/// streaming each result to the store as it arrives.
pub async fn fetch_pages(
    config: &Config,
    store: &Store,
    limit: Option<usize>,
) -> Result<FetchStats> {
    let titles: Vec<String> = config
        .pages
        .iter()
        .filter(|t| !store.has_raw(&page_id(t)))
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();
    let total = titles.len();
    if total == 0 {
        return Ok(FetchStats { total: 0, ok: 0, errors: 0 });
    }

    let client = reqwest::Client::new();
    let semaphore = Arc::new(Semaphore::new(CONCURRENCY));
    let api_url = Arc::new(config.api_url.clone());

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Channel: workers send results, main loop writes to disk
    let (tx, mut rx) = tokio::sync::mpsc::channel::<FetchRow>(CONCURRENCY * 2);

    for title in titles {
        let client = client.clone();
        let sem = Arc::clone(&semaphore);
        let api_url = Arc::clone(&api_url);
        let tx = tx.clone();

        tokio::spawn(async move {
            let _permit = sem.acquire().await.unwrap();
            let id = page_id(&title);
            let row = match fetch_with_retry(&client, &api_url, &title).await {
                Ok(markup) => FetchRow { id, title, markup: Some(markup), error: None },
                Err(e) => FetchRow { id, title, markup: None, error: Some(e.to_string()) },
            };
            let _ = tx.send(row).await;
        });
    }

    // Drop our copy of tx so rx closes when all spawned tasks finish
    drop(tx);

    let mut ok = 0usize;
    let mut errors = 0usize;

    while let Some(row) = rx.recv().await {
        match (&row.markup, &row.error) {
            (Some(markup), _) => {
                store.save_raw(&row.id, markup)?;
                ok += 1;
            }
            (None, error) => {
                warn!("Fetch failed for {}: {}", row.title, error.as_deref().unwrap_or("?"));
                errors += 1;
            }
        }
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!("Fetched {} pages ({} ok, {} errors)", total, ok, errors);

    Ok(FetchStats { total, ok, errors })
}

async fn fetch_with_retry(client: &reqwest::Client, api_url: &str, title: &str) -> Result<String> {
    let mut last_err = None;
    for attempt in 0..=MAX_RETRIES {
        match fetch_one(client, api_url, title).await {
            Ok(markup) => return Ok(markup),
            Err(e) => {
                let msg = e.to_string();
                let retryable = msg.contains("429")
                    || msg.contains("500")
                    || msg.contains("502")
                    || msg.contains("503");
                if !retryable || attempt == MAX_RETRIES {
                    return Err(e);
                }
                let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(attempt));
                warn!(
                    "Retrying {} (attempt {}/{}), backing off {:.1}s",
                    title,
                    attempt + 1,
                    MAX_RETRIES,
                    backoff.as_secs_f64()
                );
                tokio::time::sleep(backoff).await;
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| anyhow!("fetch failed for {}", title)))
}

/// One MediaWiki API call: latest revision content for a page title.
async fn fetch_one(client: &reqwest::Client, api_url: &str, title: &str) -> Result<String> {
    let response = client
        .get(api_url)
        .query(&[
            ("action", "query"),
            ("titles", title),
            ("prop", "revisions"),
            ("rvprop", "content"),
            ("rvslots", "main"),
            ("format", "json"),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP {} for {}", status.as_u16(), title));
    }

    let body: serde_json::Value = response.json().await?;
    extract_revision(&body, title)
}

/// Pull the revision text out of the API response shape:
/// query.pages.<pageid>.revisions[0].slots.main["*"]. A pageid of "-1"
/// means the page does not exist.
fn extract_revision(body: &serde_json::Value, title: &str) -> Result<String> {
    let pages = body
        .get("query")
        .and_then(|q| q.get("pages"))
        .and_then(|p| p.as_object())
        .ok_or_else(|| anyhow!("malformed API response for {}", title))?;

    let (page_id, page) = pages
        .iter()
        .next()
        .ok_or_else(|| anyhow!("no pages in API response for {}", title))?;

    if page_id == "-1" {
        return Err(anyhow!("page not found: {}", title));
    }

    let content = page
        .get("revisions")
        .and_then(|r| r.get(0))
        .and_then(|rev| rev.get("slots"))
        .and_then(|s| s.get("main"))
        .and_then(|m| m.get("*"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| anyhow!("no revision content for {}", title))?;

    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_revision_content() {
        let body = serde_json::json!({
            "query": { "pages": { "12345": {
                "revisions": [ { "slots": { "main": { "*": "== A ==\nwiki text" } } } ]
            }}}
        });
        assert_eq!(extract_revision(&body, "Kislev").unwrap(), "== A ==\nwiki text");
    }

    #[test]
    fn missing_page_is_an_error() {
        let body = serde_json::json!({
            "query": { "pages": { "-1": { "missing": "" } } }
        });
        let err = extract_revision(&body, "Nope").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn malformed_response_is_an_error() {
        let body = serde_json::json!({ "error": "boom" });
        assert!(extract_revision(&body, "X").is_err());
    }
}
