//! Shared helpers for CLI commands.

use std::path::Path;

use monseal_core::{Config, SqliteStore, StaticCatalog};

pub fn open_store() -> Result<SqliteStore, Box<dyn std::error::Error>> {
    Ok(SqliteStore::open()?)
}

/// The configured roster, or the embedded default when none is set.
pub fn load_catalog(config: &Config) -> Result<StaticCatalog, Box<dyn std::error::Error>> {
    match &config.catalog.roster_path {
        Some(path) => Ok(StaticCatalog::load(Path::new(path))?),
        None => Ok(StaticCatalog::default_roster()),
    }
}
