//! Headless-browser fetcher for JavaScript-rendered dealer sites.
//!
//! Some inventory platforms render listings entirely client-side; a plain
//! GET returns an empty shell. This fetcher drives headless Chromium through
//! CDP, waits for navigation to settle, and hands back the rendered DOM.
//! The crawler contract is identical to the HTTP path.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::CrawlError;

/// Upper bound on one navigate-and-read cycle.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Lazily launched headless browser, reused across pages of one crawl.
pub struct BrowserFetcher {
    browser: Option<(Browser, JoinHandle<()>)>,
}

impl BrowserFetcher {
    pub fn new() -> Self {
        Self { browser: None }
    }

    async fn launch(&mut self) -> Result<(), CrawlError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(CrawlError::Browser)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|error| CrawlError::Browser(error.to_string()))?;
        // The handler must be polled for the browser connection to make
        // progress; it ends when the browser closes.
        let handle = tokio::spawn(async move { while handler.next().await.is_some() {} });
        info!("launched headless browser");
        self.browser = Some((browser, handle));
        Ok(())
    }

    /// Navigate to a page and return its rendered HTML.
    pub async fn fetch(&mut self, url: &str) -> Result<String, CrawlError> {
        if self.browser.is_none() {
            self.launch().await?;
        }
        let Some((browser, _)) = &self.browser else {
            return Err(CrawlError::Browser("browser failed to launch".to_string()));
        };

        let content = tokio::time::timeout(NAVIGATION_TIMEOUT, async {
            let page = browser
                .new_page(url)
                .await
                .map_err(|error| CrawlError::Browser(error.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|error| CrawlError::Browser(error.to_string()))?;
            let content = page
                .content()
                .await
                .map_err(|error| CrawlError::Browser(error.to_string()))?;
            let _ = page.close().await;
            Ok::<String, CrawlError>(content)
        })
        .await
        .map_err(|_| CrawlError::Browser(format!("navigation to {url} timed out")))??;

        debug!("rendered {} ({} bytes)", url, content.len());
        Ok(content)
    }

    /// Shut the browser down; it relaunches on the next fetch.
    pub async fn close(&mut self) {
        if let Some((mut browser, handle)) = self.browser.take() {
            let _ = browser.close().await;
            let _ = handle.await;
        }
    }
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new()
    }
}
