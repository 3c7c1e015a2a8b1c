//! Source listing.

use console::style;

use crate::config::Settings;

/// List configured sources.
pub async fn cmd_sources(settings: &Settings) -> anyhow::Result<()> {
    let sources = settings.load_sources()?;
    if sources.is_empty() {
        println!(
            "No sources configured in {}.",
            settings.sources_file.display()
        );
        return Ok(());
    }

    for source in sources {
        let mut notes = Vec::new();
        if source.use_browser {
            notes.push("browser");
        }
        if source.fetch_detail_pages {
            notes.push("detail pages");
        }
        if !source.require_images {
            notes.push("accepts image-less");
        }
        let notes = if notes.is_empty() {
            String::new()
        } else {
            format!(" ({})", notes.join(", "))
        };
        println!(
            "{} {} - {}{}\n    {}",
            style("•").cyan(),
            style(&source.id).bold(),
            source.name,
            notes,
            source.base_url
        );
    }

    Ok(())
}
