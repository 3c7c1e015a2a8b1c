//! Field normalization: raw scraped text to typed listing attributes.
//!
//! Every extractor here is independent and tolerant of missing input - a
//! failed sub-extraction yields `None` (or a default) for that field and
//! never aborts normalization of the whole record.

use chrono::{Datelike, Utc};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::models::{Condition, NormalizedListing, RawListingCandidate, SourceConfig};
use crate::taxonomy::{match_make, CategoryMatcher};

/// Cap on images retained per listing; the first retained image is primary.
pub const MAX_IMAGES: usize = 10;

/// Prices below this are treated as parsing noise (icon alt text, unrelated
/// numbers) and normalized to contact-for-price.
const MIN_PLAUSIBLE_PRICE: u32 = 100;

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*((?:19|20)\d{2})\b").unwrap());

static DOLLAR_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9][0-9,]*)(?:\.[0-9]{1,2})?").unwrap());

static BARE_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9][0-9,]*)(?:\.[0-9]{1,2})?$").unwrap());

// 17 chars, letters I, O, Q excluded per VIN character rules.
static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-HJ-NPR-Z0-9]{17})\b").unwrap());

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z][A-Za-z .'\-]{1,40}?)\s*,\s*([A-Z]{2})\b").unwrap());

static STOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:stock|stk)\s*(?:#|no\.?|number)?\s*:?\s*([A-Za-z0-9\-]+)").unwrap()
});

/// Convert a raw candidate into a typed listing.
///
/// Pure aside from reading the current year for the condition heuristic.
pub fn normalize(
    raw: &RawListingCandidate,
    source: &SourceConfig,
    categories: &CategoryMatcher,
) -> NormalizedListing {
    let title = squish(&raw.title);
    let year = extract_year(&title);
    let make = match_make(&title).map(String::from);
    let model = extract_model(&title, make.as_deref());

    let mut category_text = title.clone();
    if let Some(hint) = &raw.type_hint {
        category_text.push(' ');
        category_text.push_str(hint);
    }
    let category_slug = categories.resolve(&category_text).to_string();

    let price = raw.price_text.as_deref().and_then(extract_price);
    let condition = infer_condition(raw.condition_text.as_deref(), &title, year);
    let vin = raw.vin_text.as_deref().and_then(extract_vin);
    let stock_number = raw.stock_text.as_deref().and_then(extract_stock);

    let (city, state) = match raw.location_text.as_deref().and_then(extract_location) {
        Some((city, state)) => (Some(city), Some(state)),
        None => (source.dealer.city.clone(), source.dealer.state.clone()),
    };

    let page_url = Url::parse(&raw.source_url)
        .or_else(|_| Url::parse(&source.base_url))
        .ok();
    let images = collect_images(&raw.image_urls, page_url.as_ref());

    NormalizedListing {
        title,
        year,
        make,
        model,
        vin,
        stock_number,
        price,
        condition,
        city,
        state,
        category_slug,
        images,
        source_url: raw.source_url.clone(),
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn squish(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `19xx`/`20xx` token at the start of the title.
pub fn extract_year(title: &str) -> Option<u16> {
    YEAR_RE
        .captures(title)
        .and_then(|c| c[1].parse::<u16>().ok())
}

/// First currency-like numeric token, rejecting implausibly small values.
pub fn extract_price(text: &str) -> Option<u32> {
    let squished = squish(text);
    let digits = DOLLAR_PRICE_RE
        .captures(&squished)
        .or_else(|| BARE_PRICE_RE.captures(&squished))
        .map(|c| c[1].replace(',', ""))?;
    let value = digits.parse::<u32>().ok()?;
    if value < MIN_PLAUSIBLE_PRICE {
        // Probable parse noise; treat as contact-for-price.
        return None;
    }
    Some(value)
}

/// 17-character VIN token near a VIN label, uppercased.
pub fn extract_vin(text: &str) -> Option<String> {
    let upper = text.to_uppercase();
    VIN_RE.captures(&upper).map(|c| c[1].to_string())
}

/// Stock number, with any "Stock #:" style label stripped.
pub fn extract_stock(text: &str) -> Option<String> {
    let squished = squish(text);
    if let Some(captures) = STOCK_RE.captures(&squished) {
        return Some(captures[1].to_string());
    }
    // A bare token is already the stock number.
    if !squished.is_empty()
        && !squished.contains(' ')
        && squished.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Some(squished);
    }
    None
}

/// `City, ST` pattern from page text.
pub fn extract_location(text: &str) -> Option<(String, String)> {
    LOCATION_RE
        .captures(&squish(text))
        .map(|c| (c[1].trim().to_string(), c[2].to_string()))
}

/// Explicit new/used cues win; a current-model-year unit with no cue is
/// inferred new; everything else defaults to used.
pub fn infer_condition(cue: Option<&str>, title: &str, year: Option<u16>) -> Condition {
    if let Some(condition) = cue.and_then(explicit_condition) {
        return condition;
    }
    if let Some(condition) = explicit_condition(title) {
        return condition;
    }
    match year {
        Some(year) if i32::from(year) >= Utc::now().year() => Condition::New,
        _ => Condition::Used,
    }
}

fn explicit_condition(text: &str) -> Option<Condition> {
    let lower = text.to_lowercase();
    let has_word = |word: &str| {
        lower.split(|c: char| !c.is_ascii_alphanumeric()) // word boundaries
            .any(|token| token == word)
    };
    // "used" first so "used, like new condition" stays used.
    if has_word("used") || lower.contains("pre-owned") {
        Some(Condition::Used)
    } else if has_word("new") {
        Some(Condition::New)
    } else {
        None
    }
}

/// First token following the make in the title, e.g. "579" in
/// "2021 Peterbilt 579 Sleeper".
pub fn extract_model(title: &str, make: Option<&str>) -> Option<String> {
    let make = make?;
    let lower = title.to_lowercase();
    let at = lower.find(&make.to_lowercase())?;
    let rest = &title[at + make.len()..];
    let token = rest
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_ascii_alphanumeric());
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Collect candidate image URLs: drop logo/icon/placeholder assets,
/// absolutize against the page URL, de-duplicate preserving first-seen
/// order, cap at [`MAX_IMAGES`].
pub fn collect_images(urls: &[String], page_url: Option<&Url>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for raw in urls {
        let candidate = raw.trim();
        if candidate.is_empty() {
            continue;
        }
        let lower = candidate.to_lowercase();
        if lower.contains("logo") || lower.contains("icon") || lower.contains("placeholder") {
            continue;
        }
        let absolute = if candidate.starts_with("http://") || candidate.starts_with("https://") {
            candidate.to_string()
        } else if let Some(base) = page_url {
            match base.join(candidate) {
                Ok(url) => url.to_string(),
                Err(_) => continue,
            }
        } else {
            continue;
        };
        if seen.insert(absolute.clone()) {
            images.push(absolute);
            if images.len() == MAX_IMAGES {
                break;
            }
        }
    }
    images
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DealerSeed, SelectorConfig};

    fn test_source() -> SourceConfig {
        SourceConfig {
            id: "interstate".to_string(),
            name: "Interstate Truck Sales".to_string(),
            base_url: "https://trucks.example.com".to_string(),
            index_url: "https://trucks.example.com/inventory?page={page}".to_string(),
            first_page: 1,
            fetch_detail_pages: false,
            use_browser: false,
            require_images: true,
            request_delay_ms: None,
            selectors: SelectorConfig::default(),
            dealer: DealerSeed {
                company: "Interstate Truck Sales".to_string(),
                phone: Some("555-0100".to_string()),
                city: Some("Tulsa".to_string()),
                state: Some("OK".to_string()),
                website: None,
            },
        }
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("2021 Peterbilt 579 Sleeper"), Some(2021));
        assert_eq!(extract_year("1998 Fruehauf tanker"), Some(1998));
        assert_eq!(extract_year("Peterbilt 579 (2021)"), None); // not at start
        assert_eq!(extract_year("3021 odd year"), None);
    }

    #[test]
    fn test_extract_price() {
        assert_eq!(extract_price("$89,500"), Some(89_500));
        assert_eq!(extract_price("  89,500  "), Some(89_500));
        assert_eq!(extract_price("$12500.00"), Some(12_500));
        // Misparsed icon alt text must not become a real price.
        assert_eq!(extract_price("$4"), None);
        assert_eq!(extract_price("Call for price"), None);
        // Phone numbers are not bare prices.
        assert_eq!(extract_price("Call 555-0100"), None);
    }

    #[test]
    fn test_extract_vin() {
        assert_eq!(
            extract_vin("VIN: 1xpbdp9x1md123456"),
            Some("1XPBDP9X1MD123456".to_string())
        );
        // I, O, Q are not valid VIN characters.
        assert_eq!(extract_vin("VIN: 1XPBDP9O1MD123456"), None);
        assert_eq!(extract_vin("VIN pending"), None);
    }

    #[test]
    fn test_extract_stock() {
        assert_eq!(extract_stock("Stock #: TR-4821"), Some("TR-4821".to_string()));
        assert_eq!(extract_stock("STK NO. 99812"), Some("99812".to_string()));
        assert_eq!(extract_stock("TR-4821"), Some("TR-4821".to_string()));
        assert_eq!(extract_stock("call the office"), None);
    }

    #[test]
    fn test_extract_location() {
        assert_eq!(
            extract_location("Located in Sioux Falls, SD 57104"),
            Some(("Sioux Falls".to_string(), "SD".to_string()))
        );
        assert_eq!(extract_location("nationwide delivery"), None);
    }

    #[test]
    fn test_condition_inference() {
        assert_eq!(
            infer_condition(Some("Condition: New"), "2019 trailer", Some(2019)),
            Condition::New
        );
        assert_eq!(
            infer_condition(None, "USED 2019 Great Dane", Some(2019)),
            Condition::Used
        );
        // No cue, old model year: used.
        assert_eq!(infer_condition(None, "2012 Kenworth T680", Some(2012)), Condition::Used);
        // No cue, current model year: inferred new.
        let current = Utc::now().year() as u16;
        assert_eq!(
            infer_condition(None, "Gooseneck trailer", Some(current)),
            Condition::New
        );
        assert_eq!(infer_condition(None, "Gooseneck trailer", None), Condition::Used);
    }

    #[test]
    fn test_collect_images_filters_and_caps() {
        let page = Url::parse("https://trucks.example.com/listing/42").unwrap();
        let mut urls: Vec<String> = (0..15)
            .map(|i| format!("https://cdn.example.com/photo-{i}.jpg"))
            .collect();
        urls.insert(0, "/assets/header-logo.png".to_string());
        urls.insert(3, "https://cdn.example.com/photo-1.jpg".to_string()); // duplicate
        urls.insert(5, "spinner-icon.gif".to_string());
        urls.push("../relative/extra.jpg".to_string());

        let images = collect_images(&urls, Some(&page));
        assert_eq!(images.len(), MAX_IMAGES);
        // First-seen order preserved, first image is the primary.
        assert_eq!(images[0], "https://cdn.example.com/photo-0.jpg");
        assert_eq!(images[1], "https://cdn.example.com/photo-1.jpg");
        assert!(images.iter().all(|u| !u.contains("logo")));
        let unique: std::collections::HashSet<_> = images.iter().collect();
        assert_eq!(unique.len(), images.len());
    }

    #[test]
    fn test_collect_images_resolves_relative() {
        let page = Url::parse("https://trucks.example.com/listing/42").unwrap();
        let images = collect_images(&["/photos/a.jpg".to_string()], Some(&page));
        assert_eq!(images, vec!["https://trucks.example.com/photos/a.jpg"]);
    }

    #[test]
    fn test_normalize_end_to_end() {
        let source = test_source();
        let raw = RawListingCandidate {
            title: "2021  Peterbilt 579 Sleeper".to_string(),
            price_text: Some("$89,500".to_string()),
            location_text: None,
            condition_text: None,
            type_hint: None,
            vin_text: Some("VIN: 1XPBDP9X1MD123456".to_string()),
            stock_text: Some("Stock # P-579".to_string()),
            image_urls: vec![
                "https://cdn.example.com/579-front.jpg".to_string(),
                "https://cdn.example.com/579-cab.jpg".to_string(),
            ],
            source_url: "https://trucks.example.com/listing/579".to_string(),
        };

        let listing = normalize(&raw, &source, &CategoryMatcher::new());
        assert_eq!(listing.title, "2021 Peterbilt 579 Sleeper");
        assert_eq!(listing.year, Some(2021));
        assert_eq!(listing.make.as_deref(), Some("Peterbilt"));
        assert_eq!(listing.model.as_deref(), Some("579"));
        assert_eq!(listing.category_slug, "sleeper-trucks");
        assert_eq!(listing.price, Some(89_500));
        assert_eq!(listing.condition, Condition::Used);
        assert_eq!(listing.vin.as_deref(), Some("1XPBDP9X1MD123456"));
        assert_eq!(listing.stock_number.as_deref(), Some("P-579"));
        // Dealer home location fills in when the page has none.
        assert_eq!(listing.city.as_deref(), Some("Tulsa"));
        assert_eq!(listing.state.as_deref(), Some("OK"));
        assert_eq!(listing.images.len(), 2);
    }
}
