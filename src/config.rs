//! Runtime configuration
//!
//! The only setting is where the catalog lives. An explicit path wins;
//! otherwise the catalog goes in the user's data directory:
//! - Linux: ~/.local/share/merge-versions/catalog.db
//! - macOS: ~/Library/Application Support/merge-versions/catalog.db
//! - Windows: %APPDATA%\merge-versions\catalog.db

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable read by the CLI for the catalog path
pub const CATALOG_ENV: &str = "MERGE_VERSIONS_CATALOG";

const APP_DIR: &str = "merge-versions";
const CATALOG_FILE: &str = "catalog.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub catalog_path: PathBuf,
}

impl Config {
    /// Build the configuration, falling back to the default catalog path
    pub fn resolve(catalog: Option<PathBuf>) -> Result<Self, ConfigError> {
        let catalog_path = match catalog {
            Some(path) => path,
            None => default_catalog_path()?,
        };

        Ok(Self { catalog_path })
    }
}

/// Get the path where the catalog should be stored
pub fn default_catalog_path() -> Result<PathBuf, ConfigError> {
    let mut path = dirs::data_dir()
        .or_else(dirs::home_dir)
        .ok_or(ConfigError::NoDataDir { env: CATALOG_ENV })?;

    path.push(APP_DIR);
    path.push(CATALOG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/mine.db"))).unwrap();
        assert_eq!(config.catalog_path, PathBuf::from("/tmp/mine.db"));
    }

    #[test]
    fn test_default_path_shape() {
        // Only meaningful where a home or data directory exists
        if let Ok(path) = default_catalog_path() {
            assert!(path.ends_with("merge-versions/catalog.db"));
        }
    }
}
