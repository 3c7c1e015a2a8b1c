//! Listing ingestion pipeline for the Axles truck and trailer marketplace.
//!
//! The pipeline has four cooperating pieces: site crawlers produce raw
//! listing candidates from dealer inventory pages, the normalizer converts
//! those into typed listing records, the progress tracker checkpoints crawl
//! state between runs, and the catalog importer de-duplicates and writes
//! listings into the hosted marketplace store.

pub mod catalog;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod import;
pub mod models;
pub mod normalize;
pub mod scrapers;
pub mod services;
pub mod taxonomy;
