//! CLI configuration.
//!
//! Values come from command-line flags (which clap also fills from
//! `PACKET_*` environment variables) and fall back to a YAML config file:
//!
//! ```yaml
//! api_key: "..."
//! project_id: "..."
//! api_url: "https://api.packet.net"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::providers::packet::API_BASE_URL;

/// Default config file location, relative to `$HOME`.
const DEFAULT_CONFIG_PATH: &str = ".packet/config.yaml";

/// Errors raised while resolving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`ConfigFile`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// No API key from any source.
    #[error("No API key: pass --api-key, set PACKET_TOKEN, or add api_key to the config file")]
    MissingApiKey,

    /// No project ID from any source.
    #[error(
        "No project ID: pass --project-id, set PACKET_PROJECT_ID, or add project_id to the config file"
    )]
    MissingProjectId,
}

/// Contents of the YAML config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// API token.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Default project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// API root override.
    #[serde(default)]
    pub api_url: Option<String>,
}

impl ConfigFile {
    /// Default config file path under the user's home directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_PATH))
    }

    /// Load the config file.
    ///
    /// An explicitly given path must exist. When no path is given the
    /// default location is tried and a missing file yields an empty config.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => {
                    debug!("No config file found, using flags and environment only");
                    Ok(Self::default())
                }
            },
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        // An empty file deserializes to unit, not a mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let file: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "Loaded config file");
        Ok(file)
    }
}

/// Effective configuration for one invocation.
#[derive(Debug, Clone, Default)]
pub struct Config {
    file: ConfigFile,
}

impl Config {
    /// Wrap a loaded config file.
    #[must_use]
    pub fn new(file: ConfigFile) -> Self {
        Self { file }
    }

    /// Resolve the API key.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingApiKey`] when no source provides one.
    pub fn api_key(&self, flag: Option<&str>) -> Result<String, ConfigError> {
        first_non_empty(flag, self.file.api_key.as_deref()).ok_or(ConfigError::MissingApiKey)
    }

    /// Resolve the API root, falling back to the public API.
    #[must_use]
    pub fn api_url(&self, flag: Option<&str>) -> String {
        first_non_empty(flag, self.file.api_url.as_deref())
            .unwrap_or_else(|| API_BASE_URL.to_string())
    }

    /// Resolve the project ID for project-scoped commands.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingProjectId`] when no source provides one.
    pub fn project_id(&self, flag: Option<&str>) -> Result<String, ConfigError> {
        first_non_empty(flag, self.file.project_id.as_deref())
            .ok_or(ConfigError::MissingProjectId)
    }
}

fn first_non_empty(primary: Option<&str>, fallback: Option<&str>) -> Option<String> {
    [primary, fallback]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
