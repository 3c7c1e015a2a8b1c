//! Selector-driven crawler for dealer inventory sites.
//!
//! One implementation covers every source whose structure can be described
//! with CSS selectors: index pages are fetched in page order, each listing
//! card yields one candidate, and sources that keep VIN/stock data off the
//! index page opt into a per-card detail fetch.

use async_trait::async_trait;
use scraper::Html;
use tracing::debug;
use url::Url;

use super::extract::{
    attr_of, image_urls_of, parse_optional, parse_selector, resolve_href, text_of,
};
use super::{CrawlError, HttpClient, SiteCrawler};
use crate::models::{RawListingCandidate, SelectorConfig, SourceConfig};

#[derive(Debug)]
struct CompiledSelectors {
    card: scraper::Selector,
    title: scraper::Selector,
    price: Option<scraper::Selector>,
    location: Option<scraper::Selector>,
    condition: Option<scraper::Selector>,
    type_hint: Option<scraper::Selector>,
    image: Option<scraper::Selector>,
    detail_link: Option<scraper::Selector>,
    detail_vin: Option<scraper::Selector>,
    detail_stock: Option<scraper::Selector>,
    detail_location: Option<scraper::Selector>,
    detail_image: Option<scraper::Selector>,
}

impl CompiledSelectors {
    fn compile(config: &SelectorConfig) -> Result<Self, CrawlError> {
        Ok(Self {
            card: parse_selector(&config.card)?,
            title: parse_selector(&config.title)?,
            price: parse_optional(config.price.as_ref())?,
            location: parse_optional(config.location.as_ref())?,
            condition: parse_optional(config.condition.as_ref())?,
            type_hint: parse_optional(config.type_hint.as_ref())?,
            image: parse_optional(config.image.as_ref())?,
            detail_link: parse_optional(config.detail_link.as_ref())?,
            detail_vin: parse_optional(config.detail_vin.as_ref())?,
            detail_stock: parse_optional(config.detail_stock.as_ref())?,
            detail_location: parse_optional(config.detail_location.as_ref())?,
            detail_image: parse_optional(config.detail_image.as_ref())?,
        })
    }
}

/// Crawler for one configured source.
pub struct HtmlSiteCrawler {
    source: SourceConfig,
    client: HttpClient,
    selectors: CompiledSelectors,
    base_url: Url,
    #[cfg(feature = "browser")]
    browser: Option<super::browser::BrowserFetcher>,
}

impl HtmlSiteCrawler {
    pub fn new(source: SourceConfig, client: HttpClient) -> Result<Self, CrawlError> {
        let selectors = CompiledSelectors::compile(&source.selectors)?;
        let base_url = Url::parse(&source.base_url)
            .map_err(|_| CrawlError::InvalidUrl(source.base_url.clone()))?;
        #[cfg(feature = "browser")]
        let browser = source
            .use_browser
            .then(super::browser::BrowserFetcher::new);
        Ok(Self {
            source,
            client,
            selectors,
            base_url,
            #[cfg(feature = "browser")]
            browser,
        })
    }

    /// Fetch a page's rendered HTML, through the browser when the source
    /// needs JavaScript.
    async fn fetch_html(&mut self, url: &str) -> Result<String, CrawlError> {
        #[cfg(feature = "browser")]
        if let Some(browser) = &mut self.browser {
            return browser.fetch(url).await;
        }
        #[cfg(not(feature = "browser"))]
        if self.source.use_browser {
            debug!(
                "source {} wants a browser but the feature is disabled; using plain HTTP",
                self.source.id
            );
        }
        self.client.get_text(url).await
    }

    /// Extract candidates and their detail-page links from an index page.
    /// A card missing the title selector is skipped; the rest of the page
    /// still parses.
    fn extract_cards(
        &self,
        html: &str,
        page_url: &Url,
    ) -> (Vec<RawListingCandidate>, Vec<Option<String>>) {
        let document = Html::parse_document(html);
        let mut candidates = Vec::new();
        let mut detail_links = Vec::new();

        for card in document.select(&self.selectors.card) {
            let Some(title) = text_of(card, &self.selectors.title) else {
                debug!("skipping card without title on {}", page_url);
                continue;
            };

            let detail_link = self
                .selectors
                .detail_link
                .as_ref()
                .and_then(|selector| attr_of(card, selector, &["href"]))
                .and_then(|href| resolve_href(page_url, &href));

            let image_urls = self
                .selectors
                .image
                .as_ref()
                .map(|selector| image_urls_of(card, selector))
                .unwrap_or_default();

            candidates.push(RawListingCandidate {
                title,
                price_text: self
                    .selectors
                    .price
                    .as_ref()
                    .and_then(|selector| text_of(card, selector)),
                location_text: self
                    .selectors
                    .location
                    .as_ref()
                    .and_then(|selector| text_of(card, selector)),
                condition_text: self
                    .selectors
                    .condition
                    .as_ref()
                    .and_then(|selector| text_of(card, selector)),
                type_hint: self
                    .selectors
                    .type_hint
                    .as_ref()
                    .and_then(|selector| text_of(card, selector)),
                vin_text: None,
                stock_text: None,
                image_urls,
                source_url: detail_link
                    .clone()
                    .unwrap_or_else(|| page_url.to_string()),
            });
            detail_links.push(detail_link);
        }

        (candidates, detail_links)
    }

    /// Fold detail-page fields into a candidate extracted from the index.
    fn extract_detail(&self, html: &str, page_url: &Url, candidate: &mut RawListingCandidate) {
        let document = Html::parse_document(html);
        let root = document.root_element();

        if let Some(selector) = &self.selectors.detail_vin {
            if let Some(vin) = text_of(root, selector) {
                candidate.vin_text = Some(vin);
            }
        }
        if let Some(selector) = &self.selectors.detail_stock {
            if let Some(stock) = text_of(root, selector) {
                candidate.stock_text = Some(stock);
            }
        }
        if let Some(selector) = &self.selectors.detail_location {
            if candidate.location_text.is_none() {
                candidate.location_text = text_of(root, selector);
            }
        }
        if let Some(selector) = &self.selectors.detail_image {
            let mut urls = image_urls_of(root, selector)
                .into_iter()
                .filter_map(|href| resolve_href(page_url, &href))
                .collect();
            candidate.image_urls.append(&mut urls);
        }
    }
}

#[async_trait]
impl SiteCrawler for HtmlSiteCrawler {
    async fn fetch_page(&mut self, page: u32) -> Result<Vec<RawListingCandidate>, CrawlError> {
        let url = self.source.index_url_for(page);
        let html = self.fetch_html(&url).await?;
        let page_url = Url::parse(&url).unwrap_or_else(|_| self.base_url.clone());

        let (mut candidates, detail_links) = self.extract_cards(&html, &page_url);
        debug!(
            "page {} of {}: {} candidates",
            page,
            self.source.id,
            candidates.len()
        );

        if self.source.fetch_detail_pages {
            for (candidate, link) in candidates.iter_mut().zip(&detail_links) {
                let Some(link) = link else { continue };
                let detail_url = Url::parse(link).unwrap_or_else(|_| page_url.clone());
                match self.fetch_html(link).await {
                    Ok(detail_html) => self.extract_detail(&detail_html, &detail_url, candidate),
                    // Keep the index-page fields; the detail data is a bonus.
                    Err(error) => debug!("detail fetch failed for {}: {}", link, error),
                }
            }
        }

        Ok(candidates)
    }

    async fn finish(&mut self) {
        #[cfg(feature = "browser")]
        if let Some(browser) = &mut self.browser {
            browser.close().await;
        }
    }
}
