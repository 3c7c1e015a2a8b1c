//! Main scrape command implementation.

use std::sync::Arc;
use std::time::Duration;

use console::style;

use crate::catalog::{CatalogStore, MemoryCatalog, RestCatalog};
use crate::checkpoint::{CheckpointStore, ProgressTracker};
use crate::config::Settings;
use crate::import::CatalogImporter;
use crate::models::SourceConfig;
use crate::scrapers::{HtmlSiteCrawler, HttpClient, RateLimitConfig, RateLimiter};
use crate::services::{run_source, RunOptions};

/// Default politeness delay between requests to one source.
const DEFAULT_DELAY_MS: u64 = 1000;

/// Crawl one or more sources and import their listings.
#[allow(clippy::too_many_arguments)]
pub async fn cmd_scrape(
    settings: &Settings,
    source_ids: &[String],
    all: bool,
    limit: u64,
    start_page: Option<u32>,
    delay_ms: Option<u64>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let sources = settings.load_sources()?;

    let selected: Vec<SourceConfig> = if all {
        sources
    } else if source_ids.is_empty() {
        println!(
            "{} No sources specified. Use --all or provide source ids.",
            style("✗").red()
        );
        println!(
            "Available sources: {}",
            sources
                .iter()
                .map(|s| s.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        return Ok(());
    } else {
        let mut selected = Vec::new();
        for id in source_ids {
            match sources.iter().find(|s| &s.id == id) {
                Some(source) => selected.push(source.clone()),
                None => anyhow::bail!("unknown source id `{id}`"),
            }
        }
        selected
    };

    // Configuration failures are fatal before any crawling begins.
    let dry_run_state = if dry_run { Some(tempfile::tempdir()?) } else { None };
    let store: Arc<dyn CatalogStore> = if dry_run {
        println!(
            "{} dry run: importing into an in-memory catalog",
            style("→").cyan()
        );
        Arc::new(MemoryCatalog::with_taxonomy())
    } else {
        let (url, key) = settings.require_catalog()?;
        Arc::new(RestCatalog::new(&url, &key)?)
    };

    // Dry runs checkpoint into a temp dir so real progress stays untouched.
    let checkpoint_dir = dry_run_state
        .as_ref()
        .map(|dir| dir.path().to_path_buf())
        .unwrap_or_else(|| settings.data_dir.clone());

    for source in &selected {
        println!("{} Crawling {}...", style("→").cyan(), source.id);

        let delay = delay_ms
            .or(source.request_delay_ms)
            .unwrap_or(DEFAULT_DELAY_MS);
        let rate_limiter =
            RateLimiter::with_config(RateLimitConfig::with_base_delay(Duration::from_millis(delay)));
        let client = HttpClient::new(rate_limiter)?;
        let mut crawler = HtmlSiteCrawler::new(source.clone(), client)?;
        let mut importer = CatalogImporter::new(
            store.clone(),
            source.dealer.clone(),
            source.require_images,
        );
        let mut tracker =
            ProgressTracker::load(CheckpointStore::new(&checkpoint_dir), &source.id)?;

        let options = RunOptions { limit, start_page };
        let summary = run_source(&mut crawler, source, &mut importer, &mut tracker, &options).await?;
        summary.print();
    }

    Ok(())
}
