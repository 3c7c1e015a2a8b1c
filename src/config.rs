//! Runtime settings: catalog credentials, data locations, source definitions.
//!
//! Catalog credentials come from the environment (a `.env` file is loaded at
//! startup); source definitions live in a TOML file. Missing credentials are
//! fatal before any crawling begins - there is nothing useful a crawl can do
//! without somewhere to import into.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;

use crate::models::{SourceConfig, SourcesFile};

/// Environment variable naming the hosted store endpoint.
pub const CATALOG_URL_VAR: &str = "AXLES_CATALOG_URL";
/// Environment variable holding the service key.
pub const CATALOG_KEY_VAR: &str = "AXLES_CATALOG_KEY";

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog_url: Option<String>,
    pub catalog_key: Option<String>,
    /// Root for checkpoint files.
    pub data_dir: PathBuf,
    pub sources_file: PathBuf,
}

impl Settings {
    /// Assemble settings from CLI overrides and the environment.
    pub fn load(sources_file: Option<PathBuf>, data_dir: Option<PathBuf>) -> Self {
        let data_dir = data_dir
            .or_else(|| std::env::var_os("AXLES_DATA_DIR").map(PathBuf::from))
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("axles")))
            .unwrap_or_else(|| PathBuf::from(".axles"));
        let sources_file = sources_file
            .or_else(|| std::env::var_os("AXLES_SOURCES").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("sources.toml"));
        Self {
            catalog_url: env_nonempty(CATALOG_URL_VAR),
            catalog_key: env_nonempty(CATALOG_KEY_VAR),
            data_dir,
            sources_file,
        }
    }

    /// Catalog endpoint and service key, or a startup-fatal error.
    pub fn require_catalog(&self) -> anyhow::Result<(String, String)> {
        match (&self.catalog_url, &self.catalog_key) {
            (Some(url), Some(key)) => Ok((url.clone(), key.clone())),
            _ => anyhow::bail!(
                "catalog store is not configured: set {CATALOG_URL_VAR} and {CATALOG_KEY_VAR} \
                 (or use --dry-run)"
            ),
        }
    }

    /// Parse the sources TOML file.
    pub fn load_sources(&self) -> anyhow::Result<Vec<SourceConfig>> {
        let contents = fs::read_to_string(&self.sources_file).with_context(|| {
            format!("reading sources file {}", self.sources_file.display())
        })?;
        let parsed: SourcesFile = toml::from_str(&contents).with_context(|| {
            format!("parsing sources file {}", self.sources_file.display())
        })?;
        Ok(parsed.sources)
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings_with(url: Option<&str>, key: Option<&str>) -> Settings {
        Settings {
            catalog_url: url.map(String::from),
            catalog_key: key.map(String::from),
            data_dir: PathBuf::from(".axles"),
            sources_file: PathBuf::from("sources.toml"),
        }
    }

    #[test]
    fn test_require_catalog() {
        assert!(settings_with(Some("https://store.example"), Some("key"))
            .require_catalog()
            .is_ok());
        assert!(settings_with(Some("https://store.example"), None)
            .require_catalog()
            .is_err());
        assert!(settings_with(None, None).require_catalog().is_err());
    }

    #[test]
    fn test_load_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
            [[source]]
            id = "midwest"
            name = "Midwest Trailer Sales"
            base_url = "https://trailers.example.com"
            index_url = "https://trailers.example.com/inventory?page={{page}}"

            [source.selectors]
            card = ".inventory-item"
            title = "h3"

            [source.dealer]
            company = "Midwest Trailer Sales"
            "#
        )
        .unwrap();

        let mut settings = settings_with(None, None);
        settings.sources_file = path;
        let sources = settings.load_sources().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "midwest");
    }

    #[test]
    fn test_load_sources_missing_file() {
        let mut settings = settings_with(None, None);
        settings.sources_file = PathBuf::from("/nonexistent/sources.toml");
        assert!(settings.load_sources().is_err());
    }
}
