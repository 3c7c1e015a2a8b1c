//! Site crawlers that turn dealer inventory pages into listing candidates.

#[cfg(feature = "browser")]
pub mod browser;
mod extract;
mod html_site;
mod http_client;
mod rate_limiter;
mod user_agent;

pub use html_site::HtmlSiteCrawler;
pub use http_client::HttpClient;
pub use rate_limiter::{RateLimitConfig, RateLimiter};
pub use user_agent::{random_user_agent, resolve_user_agent, IMPERSONATE_USER_AGENTS};

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RawListingCandidate;

/// Errors a crawler can hit while fetching or parsing one page.
///
/// All of these are recoverable at the run level: the run loop skips the
/// affected page and only stops early after consecutive failures.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("invalid URL `{0}`")]
    InvalidUrl(String),
    #[error("invalid selector `{0}`")]
    Selector(String),
    #[error("browser fetch failed: {0}")]
    Browser(String),
}

/// A paginated listing source.
///
/// `fetch_page` returns the candidates extracted from one index page; an
/// empty result signals that the source has no more pages.
#[async_trait]
pub trait SiteCrawler: Send {
    async fn fetch_page(&mut self, page: u32) -> Result<Vec<RawListingCandidate>, CrawlError>;

    /// Release anything held open across pages (e.g. a headless browser).
    async fn finish(&mut self) {}
}
