//! Per-domain politeness delays with adaptive backoff.
//!
//! Tracks request timing per domain and adapts delays based on responses:
//! backs off on 429/503, gradually recovers on success. Crawls are strictly
//! sequential, so this is pacing rather than admission control.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Rate limiter tuning knobs.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Minimum delay between requests to one domain.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Delay multiplier applied on a rate-limit response.
    pub backoff_multiplier: f64,
    /// Delay multiplier applied while recovering.
    pub recovery_multiplier: f64,
    /// Consecutive successes before a recovery step.
    pub recovery_threshold: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(120),
            backoff_multiplier: 2.0,
            recovery_multiplier: 0.5,
            recovery_threshold: 5,
        }
    }
}

impl RateLimitConfig {
    pub fn with_base_delay(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct DomainState {
    current_delay: Duration,
    last_request: Option<Instant>,
    consecutive_successes: u32,
    in_backoff: bool,
}

impl DomainState {
    fn new(base_delay: Duration) -> Self {
        Self {
            current_delay: base_delay,
            last_request: None,
            consecutive_successes: 0,
            in_backoff: false,
        }
    }

    fn time_until_ready(&self) -> Duration {
        match self.last_request {
            Some(at) => self.current_delay.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }
}

/// Adaptive rate limiter that tracks per-domain request timing.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    domains: Arc<RwLock<HashMap<String, DomainState>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_config(RateLimitConfig::default())
    }

    pub fn with_config(config: RateLimitConfig) -> Self {
        Self {
            config,
            domains: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Extract domain from URL.
    pub fn extract_domain(url: &str) -> Option<String> {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|s| s.to_string()))
    }

    /// Wait until the domain is ready, then mark the request as started.
    pub async fn acquire(&self, url: &str) -> Option<String> {
        let domain = Self::extract_domain(url)?;

        let wait_time = {
            let domains = self.domains.read().await;
            domains
                .get(&domain)
                .map(|s| s.time_until_ready())
                .unwrap_or(Duration::ZERO)
        };

        if wait_time > Duration::ZERO {
            debug!("rate limiting {}: waiting {:?}", domain, wait_time);
            tokio::time::sleep(wait_time).await;
        }

        let mut domains = self.domains.write().await;
        let state = domains
            .entry(domain.clone())
            .or_insert_with(|| DomainState::new(self.config.base_delay));
        state.last_request = Some(Instant::now());

        Some(domain)
    }

    /// Report a successful request - may shrink the delay back toward base.
    pub async fn report_success(&self, domain: &str) {
        let mut domains = self.domains.write().await;
        if let Some(state) = domains.get_mut(domain) {
            state.consecutive_successes += 1;
            if state.in_backoff && state.consecutive_successes >= self.config.recovery_threshold {
                let new_delay = Duration::from_secs_f64(
                    state.current_delay.as_secs_f64() * self.config.recovery_multiplier,
                );
                state.current_delay = new_delay.max(self.config.base_delay);
                if state.current_delay <= self.config.base_delay {
                    state.in_backoff = false;
                    debug!("domain {} recovered from backoff", domain);
                }
                state.consecutive_successes = 0;
            }
        }
    }

    /// Report a definite rate limit hit (429 or 503) - increases the delay.
    pub async fn report_rate_limit(&self, domain: &str, status_code: u16) {
        let mut domains = self.domains.write().await;
        if let Some(state) = domains.get_mut(domain) {
            state.consecutive_successes = 0;
            state.in_backoff = true;
            let new_delay = Duration::from_secs_f64(
                state.current_delay.as_secs_f64() * self.config.backoff_multiplier,
            );
            state.current_delay = new_delay.min(self.config.max_delay);
            warn!(
                "rate limited by {} (HTTP {}), backing off to {:?}",
                domain, status_code, state.current_delay
            );
        }
    }

    /// Report a server error (5xx) - mild backoff, the host may be overloaded.
    pub async fn report_server_error(&self, domain: &str) {
        let mut domains = self.domains.write().await;
        if let Some(state) = domains.get_mut(domain) {
            let new_delay = Duration::from_secs_f64(state.current_delay.as_secs_f64() * 1.5);
            state.current_delay = new_delay.min(self.config.max_delay);
            debug!(
                "server error for {}, delay increased to {:?}",
                domain, state.current_delay
            );
        }
    }

    /// Current delay for a domain (base delay if never seen).
    pub async fn current_delay(&self, domain: &str) -> Duration {
        let domains = self.domains.read().await;
        domains
            .get(domain)
            .map(|s| s.current_delay)
            .unwrap_or(self.config.base_delay)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_extract_domain() {
        assert_eq!(
            RateLimiter::extract_domain("https://trucks.example.com/inventory?page=2"),
            Some("trucks.example.com".to_string())
        );
        assert_eq!(RateLimiter::extract_domain("not a url"), None);
    }

    #[tokio::test]
    async fn test_backoff_on_rate_limit() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            base_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            ..Default::default()
        });

        limiter.acquire("https://trucks.example.com/1").await;
        limiter.report_rate_limit("trucks.example.com", 429).await;

        let delay = limiter.current_delay("trucks.example.com").await;
        assert!(delay >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_recovery_after_successes() {
        let limiter = RateLimiter::with_config(RateLimitConfig {
            base_delay: Duration::from_millis(100),
            backoff_multiplier: 2.0,
            recovery_multiplier: 0.5,
            recovery_threshold: 2,
            ..Default::default()
        });

        limiter.acquire("https://trucks.example.com/1").await;
        limiter.report_rate_limit("trucks.example.com", 503).await;
        limiter.report_success("trucks.example.com").await;
        limiter.report_success("trucks.example.com").await;

        let delay = limiter.current_delay("trucks.example.com").await;
        assert_eq!(delay, Duration::from_millis(100));
    }
}
