//! TOML-based application configuration.
//!
//! Stores:
//! - The default GitHub account to reconcile against
//! - An optional custom monster roster path
//!
//! Configuration is stored at `~/.config/monseal/config.toml`. The GitHub
//! token itself lives in the OS keyring, never in this file.

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// GitHub source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Account login used when the CLI is invoked without `--login`.
    #[serde(default)]
    pub login: Option<String>,
}

/// Monster roster configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to a TOML roster. Unset means the embedded default roster.
    #[serde(default)]
    pub roster_path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/monseal/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    fn path() -> Result<std::path::PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: std::path::PathBuf::from("~/.config/monseal"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, falling back to defaults on any failure.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.github.login, None);
        assert_eq!(parsed.catalog.roster_path, None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str(
            r#"
            [github]
            login = "octocat"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.github.login.as_deref(), Some("octocat"));
        assert_eq!(parsed.catalog.roster_path, None);
    }
}
