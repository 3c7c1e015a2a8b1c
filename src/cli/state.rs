//! Crawl state management.

use console::style;

use crate::checkpoint::CheckpointStore;
use crate::config::Settings;

/// Clear the checkpoint for a source.
pub async fn cmd_state_clear(
    settings: &Settings,
    source_id: &str,
    confirm: bool,
) -> anyhow::Result<()> {
    if !confirm {
        println!(
            "{} This removes crawl progress for `{}`; the next run re-fetches every page.",
            style("!").yellow(),
            source_id
        );
        println!("Re-run with --confirm to proceed.");
        return Ok(());
    }

    let store = CheckpointStore::new(&settings.data_dir);
    if store.clear(source_id)? {
        println!("{} Cleared crawl state for `{}`.", style("✓").green(), source_id);
    } else {
        println!("No crawl state recorded for `{source_id}`.");
    }
    Ok(())
}
