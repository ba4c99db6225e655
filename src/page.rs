//! Page session: the rendering/query boundary the scrapers run against.
//!
//! A [`Page`] owns one HTTP client and the most recently fetched document.
//! It offers the small surface the scrapers need: navigate with a bounded
//! timeout, wait a fixed delay, wait for a selector to appear (bounded,
//! absence is not an error), and parse the held body for querying.
//!
//! Each scraper constructs its own `Page` inside `scrape()`, so the session
//! is released on every exit path through ordinary ownership.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, DNT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Upper bound on a single navigation.
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(250);

const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct Page {
    client: Client,
    url: Option<Url>,
    body: String,
}

impl Page {
    /// Acquire a new page session. Failure here is fatal to the one scraper
    /// that requested it, nothing more.
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(DNT, HeaderValue::from_static("1"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(NAVIGATION_TIMEOUT)
            .build()
            .context("failed to create http client")?;

        Ok(Self {
            client,
            url: None,
            body: String::new(),
        })
    }

    /// Navigate to a URL and hold its body for querying.
    pub async fn goto(&mut self, url: &str) -> Result<()> {
        let parsed = Url::parse(url).with_context(|| format!("invalid url: {url}"))?;
        let response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .with_context(|| format!("navigation failed for {url}"))?
            .error_for_status()
            .with_context(|| format!("non-success status for {url}"))?;
        self.body = response
            .text()
            .await
            .with_context(|| format!("unable to read page body for {url}"))?;
        self.url = Some(parsed);
        debug!(url, bytes = self.body.len(), "Navigated");
        Ok(())
    }

    /// Give slow pages a fixed amount of time to settle.
    pub async fn wait(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Wait up to `timeout` for a CSS selector to match, re-fetching the page
    /// between polls. Returns `false` when the selector never appears; that
    /// is not an error.
    pub async fn wait_for_selector(&mut self, css: &str, timeout: Duration) -> bool {
        let Ok(selector) = Selector::parse(css) else {
            warn!(css, "Unparseable selector in wait_for_selector");
            return false;
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let found = {
                let document = self.document();
                document.select(&selector).next().is_some()
            };
            if found {
                return true;
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                debug!(css, "Selector did not appear before timeout");
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
            self.refetch(deadline.saturating_duration_since(tokio::time::Instant::now()))
                .await;
        }
    }

    async fn refetch(&mut self, remaining: Duration) {
        let Some(url) = self.url.clone() else {
            return;
        };
        let request = self
            .client
            .get(url)
            .timeout(remaining.max(Duration::from_millis(50)));
        match request.send().await {
            Ok(response) => {
                if let Ok(text) = response.text().await {
                    self.body = text;
                }
            }
            Err(e) => debug!(error = %e, "Re-fetch during selector wait failed"),
        }
    }

    /// Parse the held body. The document is a query-only snapshot; call again
    /// after navigation to see new content.
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }

    #[cfg(test)]
    pub fn from_html(body: &str) -> Self {
        Self {
            client: Client::new(),
            url: None,
            body: body.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_selector_finds_preloaded_content() {
        let mut page = Page::from_html("<div class='event'><h3>Jazz Night</h3></div>");
        assert!(
            page.wait_for_selector(".event", Duration::from_millis(100))
                .await
        );
    }

    #[tokio::test]
    async fn test_wait_for_selector_times_out_quietly() {
        let mut page = Page::from_html("<p>nothing here</p>");
        assert!(
            !page
                .wait_for_selector(".event", Duration::from_millis(100))
                .await
        );
    }

    #[test]
    fn test_document_queries() {
        let page = Page::from_html("<ul><li class='item'>one</li><li class='item'>two</li></ul>");
        let document = page.document();
        let selector = Selector::parse(".item").unwrap();
        assert_eq!(document.select(&selector).count(), 2);
    }
}
