//! Runtime configuration loading.
//!
//! All fields are optional in the TOML file - anything missing falls back to
//! [`RuntimeConfig::default`].
//!
//! ```toml
//! entry = "Main"
//! max_render_depth = 3
//! production = false
//! log_filter = "spark_views=debug"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config contains invalid TOML or unknown fields.
    #[error("Invalid runtime config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Options for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Name of the root view rendered by each cycle.
    pub entry: String,

    /// Nested render cycles allowed before the storm guard trips.
    pub max_render_depth: u32,

    /// Skip hot-reload bookkeeping (duplicate guard, file diffing, refresh passes).
    pub production: bool,

    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            entry: "Main".to_string(),
            max_render_depth: 3,
            production: false,
            log_filter: "info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}
