//! Axles listing ingestion - catalog population for the Axles marketplace.
//!
//! A tool for crawling dealer inventory sites, normalizing raw listing
//! fields, and importing catalog listings into the hosted marketplace store.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if axles_ingest::cli::is_verbose() {
        "axles_ingest=info"
    } else {
        "axles_ingest=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    axles_ingest::cli::run().await
}
