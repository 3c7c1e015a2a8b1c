//! Category taxonomy display.

use crate::taxonomy::{CategoryMatcher, FALLBACK_CATEGORY};

/// Print the keyword table in the order it is matched.
pub async fn cmd_categories() -> anyhow::Result<()> {
    let matcher = CategoryMatcher::new();
    println!("Keywords are tried longest first; the first hit wins.\n");
    for (keyword, slug) in matcher.entries() {
        println!("  {keyword:<20} -> {slug}");
    }
    println!("  {:<20} -> {FALLBACK_CATEGORY}", "(no match)");
    Ok(())
}
