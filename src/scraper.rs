use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::ScrapeConfig;
use crate::db::DocumentMeta;
use crate::parser;

/// How long the category filter may take to produce the first result card.
const FILTER_TIMEOUT: Duration = Duration::from_secs(30);
/// Bound on waiting for a clicked pager to render the next page's cards.
const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

// Cassation search UI. The kind filter is a table of category rows; the
// pager arrow carries an Italian tooltip ("next page").
const KIND_FILTER_ROWS: &str = "div[id='keylistContent[kind]'] tr";
const CARD: &str = "div.card";
const NEXT_PAGE_ARROW: &str = "span.pagerArrow[title='pagina successiva']";

/// The slice of browser behavior the crawl depends on. Keeping it this
/// narrow lets the whole pagination flow run against a scripted fake.
#[async_trait]
pub trait PageSource {
    async fn goto(&self, url: &str) -> Result<()>;
    /// Wait until `css` matches something, up to `timeout`.
    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<()>;
    /// Click the first element matching `css`; error if nothing matches.
    async fn click(&self, css: &str) -> Result<()>;
    /// Click the first element matching `css` whose text contains `needle`.
    async fn click_containing(&self, css: &str, needle: &str) -> Result<()>;
    /// Current rendered markup.
    async fn html(&self) -> Result<String>;
}

/// Apply the category filter and walk the result pages, accumulating card
/// metadata in page order. Stops at the first empty page, when the pager
/// arrow is gone or dead, or at the `max_pages` bound.
pub async fn crawl(page: &impl PageSource, cfg: &ScrapeConfig) -> Result<Vec<DocumentMeta>> {
    page.goto(&cfg.start_url).await?;

    info!("applying category filter: {}", cfg.category);
    page.wait_for(KIND_FILTER_ROWS, FILTER_TIMEOUT)
        .await
        .context("category filter table never appeared")?;
    page.click_containing(KIND_FILTER_ROWS, &cfg.category)
        .await
        .with_context(|| format!("category filter row '{}' not clickable", cfg.category))?;
    page.wait_for(CARD, FILTER_TIMEOUT)
        .await
        .context("no result cards appeared after applying the filter")?;

    let mut all = Vec::new();
    let mut page_num = 1;
    while page_num <= cfg.max_pages {
        let html = page.html().await?;
        let docs = parser::collect_cards(&html, &cfg.category);
        if docs.is_empty() {
            info!("page {} has no cards, stopping", page_num);
            break;
        }

        for (i, doc) in docs.iter().enumerate() {
            debug!(
                "{}. {} | {} | {} | {}",
                all.len() + i + 1,
                doc.id,
                doc.number,
                doc.date,
                doc.doc_type
            );
        }
        info!("page {}: {} cards", page_num, docs.len());

        let prev_ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
        all.extend(docs);

        // Stop before touching the pager once the bound is reached; the
        // bound caps pages visited, not just pages collected.
        if page_num == cfg.max_pages {
            info!("page limit {} reached", cfg.max_pages);
            break;
        }
        if let Err(e) = page.click(NEXT_PAGE_ARROW).await {
            debug!("next-page arrow unavailable ({e:#}), end of results");
            break;
        }
        if !wait_for_new_cards(page, &cfg.category, &prev_ids).await? {
            warn!(
                "cards unchanged after {:?}, assuming end of results",
                PAGE_TIMEOUT
            );
            break;
        }
        page_num += 1;
    }

    info!("collected {} documents", all.len());
    Ok(all)
}

/// Readiness check after clicking the pager: poll until the page shows a
/// non-empty set of card ids different from the page we just collected.
/// `false` means the bound expired without new content.
async fn wait_for_new_cards(
    page: &impl PageSource,
    category: &str,
    prev_ids: &[String],
) -> Result<bool> {
    let deadline = tokio::time::Instant::now() + PAGE_TIMEOUT;
    loop {
        let html = page.html().await?;
        let ids: Vec<String> = parser::collect_cards(&html, category)
            .iter()
            .map(|d| d.id.clone())
            .collect();
        if !ids.is_empty() && ids != prev_ids {
            return Ok(true);
        }
        if tokio::time::Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}
