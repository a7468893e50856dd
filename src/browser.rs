//! Chromium session driving the Cassation search UI over CDP.

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tracing::{debug, info};

use crate::scraper::PageSource;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One launched Chromium with a single tab. The portal keeps all state in
/// that tab, so the whole crawl runs against one page.
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Page,
}

impl BrowserSession {
    pub async fn launch(chrome: &Path, headless: bool) -> Result<Self> {
        info!("launching browser (headless={headless})");

        let mut builder = BrowserConfig::builder().chrome_executable(chrome);
        // with_head means NOT headless, confusingly
        if !headless {
            builder = builder.with_head();
        }
        let config = builder
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .build()
            .map_err(|e| anyhow!("browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("failed to open a tab")?;

        Ok(Self {
            browser: Some(browser),
            page,
        })
    }

    /// Shut the browser down. Dropping the handle kills the Chromium
    /// process and ends the spawned event loop.
    pub async fn close(&mut self) {
        self.browser = None;
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn goto(&self, url: &str) -> Result<()> {
        info!("navigating to {url}");
        self.page
            .goto(url)
            .await
            .with_context(|| format!("navigation to {url} failed"))?;
        self.page
            .wait_for_navigation()
            .await
            .context("page never finished loading")?;
        Ok(())
    }

    async fn wait_for(&self, css: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.page.find_element(css).await.is_ok() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                bail!("timed out after {timeout:?} waiting for '{css}'");
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn click(&self, css: &str) -> Result<()> {
        click_via_js(&self.page, css, None).await
    }

    async fn click_containing(&self, css: &str, needle: &str) -> Result<()> {
        click_via_js(&self.page, css, Some(needle)).await
    }

    async fn html(&self) -> Result<String> {
        Ok(self.page.content().await?)
    }
}

/// Click the first `css` match, or the first one whose text contains
/// `needle`. The portal wires its controls to JS handlers, so a DOM-level
/// click is more reliable than a synthesized mouse event.
async fn click_via_js(page: &Page, css: &str, needle: Option<&str>) -> Result<()> {
    // JSON-encode the strings so selector quoting survives the trip.
    let script = format!(
        r#"(() => {{
            const needle = {needle};
            for (const el of document.querySelectorAll({css})) {{
                if (needle === null || el.textContent.includes(needle)) {{
                    el.click();
                    return true;
                }}
            }}
            return false;
        }})()"#,
        css = serde_json::Value::from(css),
        needle = match needle {
            Some(n) => serde_json::Value::from(n),
            None => serde_json::Value::Null,
        },
    );

    let clicked: bool = page
        .evaluate(script)
        .await
        .context("click script failed")?
        .into_value()
        .context("click script returned no value")?;
    if !clicked {
        match needle {
            Some(n) => bail!("no '{css}' element containing '{n}'"),
            None => bail!("no element matches '{css}'"),
        }
    }
    debug!("clicked '{css}'");
    Ok(())
}
