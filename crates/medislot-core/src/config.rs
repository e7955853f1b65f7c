//! Runtime configuration from environment variables.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use crate::booking::SlotFinder;
use crate::logging::{self, LoggingError};

pub const DATABASE_PATH_VAR: &str = "MEDISLOT_DATABASE_PATH";
pub const SLOT_STEP_VAR: &str = "MEDISLOT_SLOT_STEP_MINUTES";
pub const SLOT_ATTEMPTS_VAR: &str = "MEDISLOT_SLOT_MAX_ATTEMPTS";
pub const LOG_FILTER_VAR: &str = "MEDISLOT_LOG";

/// Booking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingConfig {
    /// SQLite file; `None` means in-memory
    pub database_path: Option<PathBuf>,
    pub slot_step_minutes: u32,
    pub slot_max_attempts: u32,
    pub log_filter: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            slot_step_minutes: SlotFinder::DEFAULT_STEP_MINUTES,
            slot_max_attempts: SlotFinder::DEFAULT_MAX_ATTEMPTS,
            log_filter: "info".to_string(),
        }
    }
}

impl BookingConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_path = lookup(DATABASE_PATH_VAR)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let slot_step_minutes = match lookup(SLOT_STEP_VAR) {
            Some(val) => val
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Failed to parse {}", SLOT_STEP_VAR))?,
            None => defaults.slot_step_minutes,
        };

        let slot_max_attempts = match lookup(SLOT_ATTEMPTS_VAR) {
            Some(val) => val
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Failed to parse {}", SLOT_ATTEMPTS_VAR))?,
            None => defaults.slot_max_attempts,
        };

        if slot_step_minutes == 0 {
            bail!("{} must be greater than zero", SLOT_STEP_VAR);
        }
        if slot_max_attempts == 0 {
            bail!("{} must be greater than zero", SLOT_ATTEMPTS_VAR);
        }

        let log_filter = lookup(LOG_FILTER_VAR).unwrap_or(defaults.log_filter);

        Ok(Self {
            database_path,
            slot_step_minutes,
            slot_max_attempts,
            log_filter,
        })
    }

    pub fn slot_finder(&self) -> SlotFinder {
        SlotFinder::new(self.slot_step_minutes, self.slot_max_attempts)
    }

    /// Install the tracing subscriber using the configured filter.
    pub fn init_logging(&self) -> Result<bool, LoggingError> {
        logging::init_logging(&self.log_filter)
    }
}
