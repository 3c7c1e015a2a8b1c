//! Listing records at the two stages of the pipeline.
//!
//! A `RawListingCandidate` is what a site crawler can pull out of a page
//! without interpreting anything: free text and URL strings. The normalizer
//! turns it into a `NormalizedListing` with typed, validated fields; every
//! "is this present and well-formed" decision happens there, so downstream
//! code never inspects raw text.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Equipment condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    New,
    Used,
}

impl Condition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Used => "used",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "used" => Some(Self::Used),
            _ => None,
        }
    }
}

/// Raw field candidates scraped from one listing, before normalization.
///
/// Exists only within a single crawl iteration; discarded after the
/// normalizer has produced a `NormalizedListing` from it.
#[derive(Debug, Clone, Default)]
pub struct RawListingCandidate {
    /// Free-text listing title as it appears on the page.
    pub title: String,
    /// Free-text price string ("$89,500", "Call for price", ...).
    pub price_text: Option<String>,
    /// Free-text location string, usually near an address label.
    pub location_text: Option<String>,
    /// Explicit condition cue text, if the page carries one.
    pub condition_text: Option<String>,
    /// Free-text equipment-type hint (breadcrumb, badge, category label).
    pub type_hint: Option<String>,
    /// Text found near a VIN label.
    pub vin_text: Option<String>,
    /// Text found near a stock-number label.
    pub stock_text: Option<String>,
    /// Candidate image URLs in page order, possibly relative.
    pub image_urls: Vec<String>,
    /// URL of the detail page this candidate was scraped from.
    pub source_url: String,
}

/// A listing after raw text has been converted into typed, validated fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub title: String,
    pub year: Option<u16>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub vin: Option<String>,
    pub stock_number: Option<String>,
    /// Asking price in whole dollars; `None` means contact-for-price.
    pub price: Option<u32>,
    pub condition: Condition,
    pub city: Option<String>,
    /// Two-letter state code.
    pub state: Option<String>,
    /// Always resolves to a row in the category taxonomy.
    pub category_slug: String,
    /// Absolute image URLs, first-seen order, at most ten; first is primary.
    pub images: Vec<String>,
    pub source_url: String,
}

impl NormalizedListing {
    /// Stable identity hash over the fields the importer de-duplicates on.
    /// Used for logging and as the in-memory store's dedup key.
    pub fn fingerprint(&self, company: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(company.as_bytes());
        hasher.update(b"\n");
        hasher.update(self.title.as_bytes());
        hasher.update(b"\n");
        if let Some(vin) = &self.vin {
            hasher.update(vin.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_round_trip() {
        assert_eq!(Condition::parse("new"), Some(Condition::New));
        assert_eq!(Condition::parse("used"), Some(Condition::Used));
        assert_eq!(Condition::parse("refurbished"), None);
        assert_eq!(Condition::New.as_str(), "new");
    }

    #[test]
    fn test_fingerprint_changes_with_identity_fields() {
        let listing = NormalizedListing {
            title: "2021 Peterbilt 579 Sleeper".to_string(),
            year: Some(2021),
            make: Some("Peterbilt".to_string()),
            model: Some("579".to_string()),
            vin: None,
            stock_number: None,
            price: Some(89_500),
            condition: Condition::Used,
            city: None,
            state: None,
            category_slug: "sleeper-trucks".to_string(),
            images: vec![],
            source_url: String::new(),
        };

        let a = listing.fingerprint("Interstate Truck Sales");
        let b = listing.fingerprint("Other Dealer");
        assert_ne!(a, b);

        let mut with_vin = listing.clone();
        with_vin.vin = Some("1XPBDP9X1MD123456".to_string());
        assert_ne!(a, with_vin.fingerprint("Interstate Truck Sales"));
    }
}
