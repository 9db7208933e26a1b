use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{history::DEFAULT_HISTORY_LIMIT, project::ProjectMode};

/// Configuration for an inspection workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The number of quick calculations kept in the history.
    history_limit: usize,

    /// The mode given to new projects when none is specified.
    pub default_mode: ProjectMode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            default_mode: ProjectMode::default(),
        }
    }
}

/// Errors raised when reading or writing the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this configuration.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// The configuration could not be serialised.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the number of quick calculations kept in the history.
    #[must_use]
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }

    /// Sets the history limit.
    ///
    /// A limit of zero is raised to one, so the latest calculation is always
    /// kept.
    pub const fn set_history_limit(&mut self, limit: usize) {
        self.history_limit = if limit == 0 { 1 } else { limit };
    }
}

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

/// The serialized versions of the configuration.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_history_limit")]
        history_limit: usize,

        #[serde(default)]
        default_mode: ProjectMode,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                history_limit,
                default_mode,
            } => {
                let mut config = Self {
                    history_limit,
                    default_mode,
                };
                config.set_history_limit(history_limit);
                config
            }
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            history_limit: config.history_limit,
            default_mode: config.default_mode,
        }
    }
}
