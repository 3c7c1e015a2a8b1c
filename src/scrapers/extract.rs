//! Selector evaluation helpers shared by site crawlers.

use scraper::{ElementRef, Selector};
use url::Url;

use super::CrawlError;
use crate::normalize::squish;

/// Attributes checked, in order, when pulling an image URL off an element.
/// Lazy-loading galleries stash the real URL in a data attribute.
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-original"];

pub(crate) fn parse_selector(selector: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector).map_err(|_| CrawlError::Selector(selector.to_string()))
}

pub(crate) fn parse_optional(selector: Option<&String>) -> Result<Option<Selector>, CrawlError> {
    selector.map(|s| parse_selector(s)).transpose()
}

/// Squished text of the first element matching `selector`.
pub(crate) fn text_of(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| squish(&found.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

/// First present attribute of the first element matching `selector`.
pub(crate) fn attr_of(
    element: ElementRef<'_>,
    selector: &Selector,
    attrs: &[&str],
) -> Option<String> {
    let found = element.select(selector).next()?;
    attrs
        .iter()
        .find_map(|attr| found.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Image URLs from every element matching `selector`, in DOM order.
pub(crate) fn image_urls_of(element: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    element
        .select(selector)
        .filter_map(|found| {
            IMAGE_ATTRS
                .iter()
                .find_map(|attr| found.value().attr(attr))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .collect()
}

/// Absolutize an href against the page URL.
pub(crate) fn resolve_href(base: &Url, href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    base.join(href).ok().map(|url| url.to_string())
}
