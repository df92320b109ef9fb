//! Configuration file loader.

use std::path::{Path, PathBuf};

use super::WatchConfig;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".review-watch.toml";

/// Where watch settings come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`; it must exist.
    Explicit(PathBuf),
    /// Default locations, first existing file wins, none is fine.
    Search(Vec<PathBuf>),
}

/// Watch settings together with the file they were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: WatchConfig,
    pub path: Option<PathBuf>,
}

/// Reads `WatchConfig` from an explicit file or the default locations.
#[derive(Debug)]
pub struct ConfigLoader {
    source: ConfigSource,
}

impl ConfigLoader {
    /// Look in the working directory, then the user config directory.
    #[must_use]
    pub fn new() -> Self {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("review-watch").join("config.toml"));
        }

        Self {
            source: ConfigSource::Search(paths),
        }
    }

    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            source: ConfigSource::Explicit(path),
        }
    }

    #[must_use]
    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// Read the settings file.
    ///
    /// Without an explicit path and with no file in the default locations,
    /// every setting must come from the command line.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file is missing or unreadable, or if
    /// any chosen file fails to parse.
    pub fn load(&self) -> Result<LoadedConfig, ConfigError> {
        let path = match &self.source {
            ConfigSource::Explicit(path) => path,
            ConfigSource::Search(paths) => match paths.iter().find(|p| p.exists()) {
                Some(path) => path,
                None => {
                    tracing::debug!(searched = ?paths, "No config file found");
                    return Ok(LoadedConfig {
                        config: WatchConfig::default(),
                        path: None,
                    });
                }
            },
        };

        Ok(LoadedConfig {
            config: read_config(path)?,
            path: Some(path.clone()),
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config(path: &Path) -> Result<WatchConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur during configuration loading and resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Missing required setting: {0}")]
    MissingField(&'static str),

    #[error("Failed to read token file {path}: {source}")]
    TokenReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Token file {0} is empty")]
    EmptyToken(PathBuf),

    #[error("Poll interval must be at least one second")]
    InvalidInterval,
}
