//! Tracing subscriber initialization.
//!
//! Logs go to stderr. `RUST_LOG` wins over the filter passed in.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::RuntimeConfig;

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Filter directive could not be parsed.
    #[error("Invalid log filter `{filter}`: {reason}")]
    InvalidFilter { filter: String, reason: String },

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the global tracing subscriber.
///
/// # Arguments
///
/// * `filter` - Fallback filter directive (e.g. `"info"`, `"spark_views=debug"`)
pub fn init(filter: &str) -> Result<(), LoggingError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(env_filter) => env_filter,
        Err(_) => EnvFilter::try_new(filter).map_err(|err| LoggingError::InvalidFilter {
            filter: filter.to_string(),
            reason: err.to_string(),
        })?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

/// Initialize with the config's `log_filter` as the fallback.
pub fn init_from_config(config: &RuntimeConfig) -> Result<(), LoggingError> {
    init(&config.log_filter)
}
