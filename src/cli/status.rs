//! Crawl status display.

use console::style;

use crate::checkpoint::CheckpointStore;
use crate::config::Settings;

/// Show checkpoint state for one source, or all of them.
pub async fn cmd_status(settings: &Settings, source_id: Option<&str>) -> anyhow::Result<()> {
    let store = CheckpointStore::new(&settings.data_dir);
    let ids = match source_id {
        Some(id) => vec![id.to_string()],
        None => store.list()?,
    };

    if ids.is_empty() {
        println!("No crawl state recorded yet.");
        return Ok(());
    }

    for id in ids {
        let checkpoint = store.load(&id)?;
        let last_run = checkpoint
            .last_run
            .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{} {}: {} pages complete, {} imported, last run {}",
            style("•").cyan(),
            id,
            checkpoint.completed_pages.len(),
            checkpoint.imported_total,
            last_run
        );
    }

    Ok(())
}
