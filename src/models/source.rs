//! Per-source crawl configuration.
//!
//! These structs define the TOML-configurable behavior for site crawlers:
//! pagination scheme, CSS selectors for listing cards and detail fields, and
//! the dealer contact metadata used to provision the owning account.

use serde::{Deserialize, Serialize};

/// Top-level shape of the sources TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesFile {
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
}

/// One crawlable dealer inventory source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Short machine id, used for checkpoint files and CLI arguments.
    pub id: String,
    /// Human-readable source name.
    pub name: String,
    /// Site origin, used to absolutize relative URLs.
    pub base_url: String,
    /// Index page URL template containing a `{page}` placeholder.
    pub index_url: String,
    /// First page number of the pagination scheme (some sites start at 0).
    #[serde(default = "default_first_page")]
    pub first_page: u32,
    /// Fetch each card's detail page for the fields the index omits.
    #[serde(default)]
    pub fetch_detail_pages: bool,
    /// Drive a headless browser instead of plain HTTP (JS-rendered sites).
    #[serde(default)]
    pub use_browser: bool,
    /// Skip listings that carry no images.
    #[serde(default = "default_true")]
    pub require_images: bool,
    /// Minimum delay between requests to this source, in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    pub selectors: SelectorConfig,
    pub dealer: DealerSeed,
}

impl SourceConfig {
    /// Resolve the index URL for a given page number.
    pub fn index_url_for(&self, page: u32) -> String {
        self.index_url.replace("{page}", &page.to_string())
    }
}

/// CSS selectors for extracting listing fields.
///
/// `card` scopes one listing on an index page; the field selectors are
/// evaluated inside a card (or against the whole detail page when prefixed
/// into `detail_*`). Missing optional selectors simply yield absent fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// One element per listing on the index page.
    pub card: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Anchor linking a card to its detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_link: Option<String>,
    /// Selectors evaluated against the fetched detail page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_vin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_stock: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_image: Option<String>,
}

/// Dealer contact metadata used when provisioning the owning account.
///
/// The company name is the natural dedup key: the importer looks an account
/// up by company before ever creating one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DealerSeed {
    pub company: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

fn default_first_page() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url_for() {
        let source = SourceConfig {
            id: "midwest".to_string(),
            name: "Midwest Trailer Sales".to_string(),
            base_url: "https://example.com".to_string(),
            index_url: "https://example.com/inventory?page={page}".to_string(),
            first_page: 1,
            fetch_detail_pages: false,
            use_browser: false,
            require_images: true,
            request_delay_ms: None,
            selectors: SelectorConfig::default(),
            dealer: DealerSeed::default(),
        };
        assert_eq!(
            source.index_url_for(3),
            "https://example.com/inventory?page=3"
        );
    }

    #[test]
    fn test_sources_file_parses() {
        let toml = r#"
            [[source]]
            id = "midwest"
            name = "Midwest Trailer Sales"
            base_url = "https://example.com"
            index_url = "https://example.com/inventory?page={page}"
            fetch_detail_pages = true

            [source.selectors]
            card = ".inventory-item"
            title = ".inventory-item h3"
            price = ".price"
            detail_link = "a.details"

            [source.dealer]
            company = "Midwest Trailer Sales"
            city = "Des Moines"
            state = "IA"
        "#;
        let parsed: SourcesFile = toml::from_str(toml).unwrap();
        assert_eq!(parsed.sources.len(), 1);
        let source = &parsed.sources[0];
        assert_eq!(source.first_page, 1);
        assert!(source.require_images);
        assert!(source.fetch_detail_pages);
        assert_eq!(source.dealer.state.as_deref(), Some("IA"));
    }
}
