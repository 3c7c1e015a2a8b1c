//! Per-source ingestion run: crawl, normalize, import, checkpoint.
//!
//! The run is strictly sequential - each fetch is awaited before the next
//! begins, because politeness pacing matters more than throughput here. A
//! run can stop between pages (limit reached, repeated failures) and a later
//! invocation resumes from the checkpoint.

use console::style;
use tracing::{info, warn};

use crate::checkpoint::ProgressTracker;
use crate::import::{CatalogImporter, ImportOutcome};
use crate::models::SourceConfig;
use crate::normalize::normalize;
use crate::scrapers::SiteCrawler;
use crate::taxonomy::CategoryMatcher;

/// Consecutive page-fetch failures tolerated before a run stops early.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Operator knobs for one run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after importing this many listings (0 = unlimited).
    pub limit: u64,
    /// Start from this page instead of the source's first page.
    pub start_page: Option<u32>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source ran out of pages.
    Exhausted,
    /// The per-run import limit was reached.
    LimitReached,
    /// Consecutive fetch failures exceeded the budget.
    TooManyFailures,
    /// The very first page of the run came back with zero listings.
    EmptyFirstPage,
}

/// Tally printed at the end of every run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_id: String,
    pub pages_visited: u64,
    pub listings_found: u64,
    pub imported: u64,
    pub skipped_duplicate: u64,
    pub skipped_no_images: u64,
    pub errors: u64,
    pub stop: StopReason,
    /// Where a later run should pick up, when the source wasn't exhausted.
    pub next_page: Option<u32>,
    /// Listings imported across all runs of this source, this one included.
    pub imported_total: u64,
}

impl RunSummary {
    fn new(source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            pages_visited: 0,
            listings_found: 0,
            imported: 0,
            skipped_duplicate: 0,
            skipped_no_images: 0,
            errors: 0,
            stop: StopReason::Exhausted,
            next_page: None,
            imported_total: 0,
        }
    }

    fn record(&mut self, outcome: &ImportOutcome) {
        match outcome {
            ImportOutcome::Imported => self.imported += 1,
            ImportOutcome::SkippedDuplicate => self.skipped_duplicate += 1,
            ImportOutcome::SkippedNoImages => self.skipped_no_images += 1,
            ImportOutcome::Error(_) => self.errors += 1,
        }
    }

    /// Print the operator-facing tally.
    pub fn print(&self) {
        println!(
            "{} {}: {} pages, {} found, {} imported, {} duplicates, {} without images, {} errors",
            style("✓").green(),
            self.source_id,
            self.pages_visited,
            self.listings_found,
            self.imported,
            self.skipped_duplicate,
            self.skipped_no_images,
            self.errors
        );
        match self.stop {
            StopReason::Exhausted => println!(
                "  source exhausted; {} imported across all runs",
                self.imported_total
            ),
            StopReason::EmptyFirstPage => println!(
                "  {} first page returned no listings - possible rate limiting",
                style("✗").red()
            ),
            StopReason::LimitReached => {
                if let Some(page) = self.next_page {
                    let per_page = if self.pages_visited > 0 {
                        self.listings_found / self.pages_visited
                    } else {
                        0
                    };
                    println!(
                        "  run limit reached; next run resumes at page {page} \
                         (~{per_page} listings/page so far)"
                    );
                }
            }
            StopReason::TooManyFailures => {
                if let Some(page) = self.next_page {
                    println!(
                        "  {} stopped after repeated fetch failures; next run resumes at page {page}",
                        style("!").yellow()
                    );
                }
            }
        }
    }
}

/// Crawl one source to completion (or an early stop), importing as it goes.
///
/// Pages already recorded in the checkpoint are never re-fetched. Progress
/// is persisted after every completed page, so however a run ends, nothing
/// already done is lost.
pub async fn run_source(
    crawler: &mut dyn SiteCrawler,
    source: &SourceConfig,
    importer: &mut CatalogImporter,
    tracker: &mut ProgressTracker,
    options: &RunOptions,
) -> anyhow::Result<RunSummary> {
    let categories = CategoryMatcher::new();
    let mut summary = RunSummary::new(&source.id);
    let mut page = options.start_page.unwrap_or(source.first_page);
    let mut consecutive_failures = 0u32;
    let mut resumed = false;

    let stop = loop {
        if tracker.should_skip(page) {
            resumed = true;
            page += 1;
            continue;
        }

        match crawler.fetch_page(page).await {
            Err(error) => {
                consecutive_failures += 1;
                warn!(
                    "page {} of {} failed ({}/{}): {}",
                    page, source.id, consecutive_failures, MAX_CONSECUTIVE_FAILURES, error
                );
                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    break StopReason::TooManyFailures;
                }
                page += 1;
            }
            Ok(candidates) => {
                consecutive_failures = 0;
                summary.pages_visited += 1;

                if candidates.is_empty() {
                    // Zero listings on the run's true first page smells like
                    // rate limiting; after a resume it is just exhaustion.
                    break if summary.listings_found == 0 && !resumed {
                        StopReason::EmptyFirstPage
                    } else {
                        StopReason::Exhausted
                    };
                }

                let mut imported_this_page = 0u64;
                for raw in &candidates {
                    summary.listings_found += 1;
                    let listing = normalize(raw, source, &categories);
                    let outcome = importer.import(&listing).await;
                    if outcome == ImportOutcome::Imported {
                        imported_this_page += 1;
                    }
                    summary.record(&outcome);
                }

                if let Err(error) = tracker.record_page_complete(page, imported_this_page) {
                    crawler.finish().await;
                    return Err(error);
                }
                info!(
                    "page {} of {}: {} listings, {} imported",
                    page,
                    source.id,
                    candidates.len(),
                    imported_this_page
                );

                page += 1;
                if options.limit > 0 && summary.imported >= options.limit {
                    break StopReason::LimitReached;
                }
            }
        }
    };

    crawler.finish().await;
    summary.stop = stop;
    summary.next_page = match stop {
        StopReason::Exhausted | StopReason::EmptyFirstPage => None,
        StopReason::LimitReached | StopReason::TooManyFailures => Some(page),
    };
    summary.imported_total = tracker.checkpoint().imported_total;
    Ok(summary)
}
