//! Configuration file loader and validation.

use std::path::{Path, PathBuf};

use super::types::Config;

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
    /// Whether a missing file is an error (explicit `--config`).
    required: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: log-sentinel.toml
        search_paths.push(PathBuf::from("log-sentinel.toml"));

        // 2. User config directory: ~/.config/log-sentinel/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("log-sentinel").join("config.toml"));
        }

        Self {
            search_paths,
            required: false,
        }
    }

    /// Create a config loader with a specific config file path.
    ///
    /// The file must exist.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
            required: true,
        }
    }

    /// Load configuration from the first available file.
    ///
    /// With the default search paths, an empty configuration is returned
    /// when no file exists (it will fail validation).
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or parsed.
    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.required {
            if let Some(path) = self.search_paths.first() {
                return Self::load_from_path(path);
            }
        }

        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using empty configuration");
        Ok(Config::default())
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Check the configuration for missing or empty required values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_files.is_empty() && self.log_directories.is_empty() {
            return Err(invalid("at least one log file or log directory is required"));
        }
        if self.notifiers.is_empty() {
            return Err(invalid("at least one notifier is required"));
        }

        for (i, rule) in self.log_files.iter().enumerate() {
            if rule.path.as_os_str().is_empty() {
                return Err(invalid(format!("log_files[{i}]: path must not be empty")));
            }
            if !has_keyword(&rule.keywords) {
                return Err(invalid(format!("log_files[{i}]: keywords must not be empty")));
            }
        }

        for (i, rule) in self.log_directories.iter().enumerate() {
            if rule.path.as_os_str().is_empty() {
                return Err(invalid(format!(
                    "log_directories[{i}]: path must not be empty"
                )));
            }
            if !has_keyword(&rule.keywords) {
                return Err(invalid(format!(
                    "log_directories[{i}]: keywords must not be empty"
                )));
            }
            if rule.extensions.is_empty() {
                return Err(invalid(format!(
                    "log_directories[{i}]: at least one extension is required"
                )));
            }
        }

        for (i, notifier) in self.notifiers.iter().enumerate() {
            if notifier.webhook.trim().is_empty() {
                return Err(invalid(format!("notifiers[{i}]: webhook must not be empty")));
            }
        }
        if !self.notifiers.iter().any(|n| n.enabled) {
            return Err(invalid("at least one notifier must be enabled"));
        }

        if self.engine.max_file_size == 0 || self.engine.buffer_size == 0 {
            return Err(invalid("engine limits must be greater than zero"));
        }
        if self.engine.reconcile_interval_secs == 0 {
            return Err(invalid("engine.reconcile_interval_secs must be greater than zero"));
        }

        Ok(())
    }
}

/// A rule with only empty keywords can never match.
fn has_keyword(keywords: &[String]) -> bool {
    keywords.iter().any(|k| !k.is_empty())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}

/// Errors that can occur during configuration loading.
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

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
