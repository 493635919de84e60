//! Runtime configuration
//!
//! Read from a YAML file, then overridden by `MINDGRAPH_DB` and
//! `MINDGRAPH_PAGE_SIZE` when set. Every field has a default, so an empty
//! file (or no file at all) is a valid configuration.

use crate::center::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the database path
pub const DB_ENV: &str = "MINDGRAPH_DB";

/// Environment variable overriding the page size
pub const PAGE_SIZE_ENV: &str = "MINDGRAPH_PAGE_SIZE";

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Log output format of the binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database file; the platform data directory when unset
    pub db_path: Option<PathBuf>,
    /// Results per page of the centered-element queries
    pub page_size: usize,
    /// Extraction depth used when a caller gives none
    pub default_depth: u32,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            page_size: DEFAULT_PAGE_SIZE,
            default_depth: 1,
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Parse a YAML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Defaults with environment overrides applied
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides looked up through `var`
    pub fn with_env_overrides(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(db) = var(DB_ENV).filter(|v| !v.is_empty()) {
            self.db_path = Some(PathBuf::from(db));
        }
        if let Some(size) = var(PAGE_SIZE_ENV) {
            self.page_size = size
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: PAGE_SIZE_ENV,
                    value: size,
                })?;
        }
        Ok(self)
    }

    /// Configured database path, or `<data dir>/mindgraph/mindgraph.db`
    pub fn db_path(&self) -> PathBuf {
        self.db_path.clone().unwrap_or_else(default_db_path)
    }
}

fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("mindgraph").join("mindgraph.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 28);
        assert_eq!(config.default_depth, 1);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_yaml("page_size: 10\nlog_format: json\n").unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.default_depth, 1);
        assert!(config.db_path.is_none());
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(matches!(
            Config::from_yaml("log_format: xml"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let env = HashMap::from([(DB_ENV, "/tmp/graph.db"), (PAGE_SIZE_ENV, "5")]);
        let config = Config::from_yaml("page_size: 10")
            .unwrap()
            .with_env_overrides(|name| env.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.db_path(), PathBuf::from("/tmp/graph.db"));
        assert_eq!(config.page_size, 5);
    }

    #[test]
    fn zero_page_size_is_invalid() {
        let err = Config::default()
            .with_env_overrides(|name| (name == PAGE_SIZE_ENV).then(|| "0".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn load_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mindgraph.yaml");
        std::fs::write(&path, "default_depth: 3\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().default_depth, 3);
        assert!(matches!(
            Config::load(dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
