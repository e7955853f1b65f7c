//! Tracing subscriber setup.

use thiserror::Error;
use tracing::info;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Logging setup errors.
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: ParseError,
    },
}

/// Install a fmt subscriber filtered by `filter` (an `EnvFilter` directive
/// such as `info` or `medislot_core=debug`).
///
/// Returns `Ok(false)` if a global subscriber was already installed, which is
/// not fatal for a library.
pub fn init_logging(filter: &str) -> Result<bool, LoggingError> {
    let env_filter = EnvFilter::try_new(filter).map_err(|source| LoggingError::InvalidFilter {
        filter: filter.to_string(),
        source,
    })?;

    let installed = Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok();

    if installed {
        info!(filter, "tracing subscriber initialized");
    }
    Ok(installed)
}
