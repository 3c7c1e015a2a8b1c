//! HTTP client for index and detail page fetches.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::user_agent::resolve_user_agent;
use super::CrawlError;

/// Default per-request timeout. A slow dealer platform is a per-page
/// failure, never a hung run.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client with a realistic browser user agent and per-domain pacing.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter,
}

impl HttpClient {
    /// Create a client with an impersonated browser user agent.
    pub fn new(rate_limiter: RateLimiter) -> Result<Self, CrawlError> {
        Self::with_user_agent(rate_limiter, None)
    }

    /// Create a client with a custom user agent string.
    pub fn with_user_agent(
        rate_limiter: RateLimiter,
        user_agent: Option<&str>,
    ) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .user_agent(resolve_user_agent(user_agent))
            .timeout(FETCH_TIMEOUT)
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self {
            client,
            rate_limiter,
        })
    }

    /// Fetch a page as text, honoring the politeness delay for its domain.
    pub async fn get_text(&self, url: &str) -> Result<String, CrawlError> {
        let domain = self.rate_limiter.acquire(url).await;

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if let Some(domain) = &domain {
            if status.as_u16() == 429 || status.as_u16() == 503 {
                self.rate_limiter
                    .report_rate_limit(domain, status.as_u16())
                    .await;
            } else if status.is_server_error() {
                self.rate_limiter.report_server_error(domain).await;
            } else if status.is_success() {
                self.rate_limiter.report_success(domain).await;
            }
        }

        if !status.is_success() {
            return Err(CrawlError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        debug!("fetched {} ({} bytes)", url, body.len());
        Ok(body)
    }
}
