//! Data models for the ingestion pipeline.

mod listing;
mod source;

pub use listing::{Condition, NormalizedListing, RawListingCandidate};
pub use source::{DealerSeed, SelectorConfig, SourceConfig, SourcesFile};
