//! Canonical category and manufacturer tables.
//!
//! The scraper variants in the field drifted apart on their keyword tables;
//! this module is the single authoritative copy. Keywords are matched as
//! case-insensitive substrings, longest keyword first, so a specific term
//! like "end dump" always beats a generic one like "dump" regardless of the
//! order entries are written in below.

/// Slug assigned when no keyword matches.
pub const FALLBACK_CATEGORY: &str = "specialty";

/// Keyword-to-slug table for the fixed category taxonomy.
///
/// Order here is cosmetic; lookup sorts by keyword length at construction.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    // Trailers
    ("end dump", "end-dump-trailers"),
    ("side dump", "side-dump-trailers"),
    ("belly dump", "bottom-dump-trailers"),
    ("bottom dump", "bottom-dump-trailers"),
    ("dump", "dump-trailers"),
    ("flatbed", "flatbed-trailers"),
    ("flat bed", "flatbed-trailers"),
    ("dry van", "dry-van-trailers"),
    ("reefer", "reefer-trailers"),
    ("refrigerated", "reefer-trailers"),
    ("lowboy", "lowboy-trailers"),
    ("low boy", "lowboy-trailers"),
    ("drop deck", "drop-deck-trailers"),
    ("step deck", "drop-deck-trailers"),
    ("tanker", "tanker-trailers"),
    ("tank trailer", "tanker-trailers"),
    ("gooseneck", "gooseneck-trailers"),
    ("car hauler", "car-hauler-trailers"),
    ("car carrier", "car-hauler-trailers"),
    ("enclosed", "enclosed-trailers"),
    ("cargo trailer", "enclosed-trailers"),
    ("utility trailer", "utility-trailers"),
    ("equipment trailer", "equipment-trailers"),
    ("hopper", "hopper-trailers"),
    ("grain trailer", "hopper-trailers"),
    ("livestock", "livestock-trailers"),
    ("curtain side", "curtain-side-trailers"),
    ("curtainside", "curtain-side-trailers"),
    // Trucks
    ("sleeper", "sleeper-trucks"),
    ("day cab", "day-cab-trucks"),
    ("daycab", "day-cab-trucks"),
    ("box truck", "box-trucks"),
    ("straight truck", "box-trucks"),
    ("dump truck", "dump-trucks"),
    ("semi truck", "semi-trucks"),
    ("service truck", "service-trucks"),
    ("tow truck", "tow-trucks"),
    ("wrecker", "tow-trucks"),
    // Heavy equipment
    ("mini excavator", "mini-excavators"),
    ("excavator", "excavators"),
    ("skid steer", "skid-steers"),
    ("wheel loader", "wheel-loaders"),
    ("backhoe", "backhoes"),
    ("dozer", "dozers"),
    ("bulldozer", "dozers"),
    ("crane", "cranes"),
    ("forklift", "forklifts"),
    ("telehandler", "telehandlers"),
];

/// Manufacturer names recognized in listing titles.
///
/// Matched as case-insensitive substrings, longest first, so "Western Star"
/// wins over any shorter entry it could shadow.
const KNOWN_MAKES: &[&str] = &[
    // Trucks
    "Peterbilt",
    "Kenworth",
    "Freightliner",
    "Western Star",
    "International",
    "Volvo",
    "Mack",
    "Sterling",
    "Isuzu",
    "Hino",
    "Ford",
    "Chevrolet",
    "GMC",
    // Trailers
    "Great Dane",
    "Utility",
    "Wabash",
    "Stoughton",
    "Hyundai",
    "Vanguard",
    "Fontaine",
    "Transcraft",
    "Dorsey",
    "Reitnouer",
    "MAC Trailer",
    "East",
    "Wilson",
    "Timpte",
    "Manac",
    "Trail King",
    "XL Specialized",
    "Talbert",
    "Fruehauf",
    "Heil",
    "Polar",
    // Heavy equipment
    "Caterpillar",
    "Komatsu",
    "John Deere",
    "Bobcat",
    "Kubota",
    "JCB",
    "Case",
];

/// Longest-match-first lookup over the canonical keyword table.
#[derive(Debug, Clone)]
pub struct CategoryMatcher {
    /// (lowercased keyword, slug), sorted by keyword length descending.
    entries: Vec<(String, &'static str)>,
}

impl CategoryMatcher {
    pub fn new() -> Self {
        let mut entries: Vec<(String, &'static str)> = CATEGORY_KEYWORDS
            .iter()
            .map(|(keyword, slug)| (keyword.to_lowercase(), *slug))
            .collect();
        // Longest keyword first; ties keep table order (sort is stable).
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { entries }
    }

    /// Map free text to a category slug, falling back to the catch-all.
    pub fn resolve(&self, text: &str) -> &'static str {
        let haystack = text.to_lowercase();
        self.entries
            .iter()
            .find(|(keyword, _)| haystack.contains(keyword.as_str()))
            .map(|(_, slug)| *slug)
            .unwrap_or(FALLBACK_CATEGORY)
    }

    /// The full keyword table, longest keyword first.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), *s))
    }
}

impl Default for CategoryMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// All distinct category slugs, fallback included.
pub fn all_slugs() -> Vec<&'static str> {
    let mut slugs: Vec<&'static str> = CATEGORY_KEYWORDS.iter().map(|(_, slug)| *slug).collect();
    slugs.push(FALLBACK_CATEGORY);
    slugs.sort_unstable();
    slugs.dedup();
    slugs
}

/// Find the manufacturer named in a title, longest match first.
pub fn match_make(title: &str) -> Option<&'static str> {
    let haystack = title.to_lowercase();
    let mut best: Option<&'static str> = None;
    for make in KNOWN_MAKES {
        if haystack.contains(&make.to_lowercase()) {
            match best {
                Some(current) if current.len() >= make.len() => {}
                _ => best = Some(make),
            }
        }
    }
    best
}
