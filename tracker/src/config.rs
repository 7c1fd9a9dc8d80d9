//! Configuration module for Specimen Tracker.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `SPECIMEN_TIMEOUT_MINUTES` | No | 5 | Idle minutes before the session resets (0 disables) |
//! | `SPECIMEN_SHOW_NOTIFICATIONS` | No | true | Send chat notifications for lamps and resets |
//! | `SPECIMEN_NEVER_RESET_LAMPS` | No | false | Keep the antique lamp counter across resets |
//! | `SPECIMEN_TICK_INTERVAL_MS` | No | 600 | Heartbeat period used by the `follow` host |
//!
//! Boolean values accept `true`/`false`, `1`/`0`, `yes`/`no` and `on`/`off`.
//!
//! # Example
//!
//! ```no_run
//! use specimen_tracker::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("Timeout: {} minutes", config.timeout_minutes);
//! ```

use std::env;

use thiserror::Error;

use crate::session::{SessionConfig, DEFAULT_TIMEOUT_MINUTES};

/// Default heartbeat period, one game tick.
const DEFAULT_TICK_INTERVAL_MS: u64 = 600;

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Configuration for the Specimen Tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Minutes of inactivity before an automatic reset. Zero disables it.
    pub timeout_minutes: u32,

    /// Whether chat notifications are sent.
    pub show_notifications: bool,

    /// Whether the antique lamp counter survives resets.
    pub never_reset_lamps: bool,

    /// Milliseconds between synthetic ticks in `follow` mode.
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            show_notifications: true,
            never_reset_lamps: false,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `SPECIMEN_TIMEOUT_MINUTES` is set but is not a non-negative integer
    /// - a boolean variable is set to something unrecognised
    /// - `SPECIMEN_TICK_INTERVAL_MS` is set but is not a positive integer
    pub fn from_env() -> Result<Self, ConfigError> {
        // Optional: SPECIMEN_TIMEOUT_MINUTES (default: 5, 0 disables)
        let timeout_minutes = match env::var("SPECIMEN_TIMEOUT_MINUTES") {
            Ok(val) => val
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidValue {
                    key: "SPECIMEN_TIMEOUT_MINUTES".to_string(),
                    message: format!("expected non-negative integer, got '{val}'"),
                })?,
            Err(_) => DEFAULT_TIMEOUT_MINUTES,
        };

        let show_notifications = bool_var("SPECIMEN_SHOW_NOTIFICATIONS", true)?;
        let never_reset_lamps = bool_var("SPECIMEN_NEVER_RESET_LAMPS", false)?;

        // Optional: SPECIMEN_TICK_INTERVAL_MS (default: 600, must be > 0)
        let tick_interval_ms = match env::var("SPECIMEN_TICK_INTERVAL_MS") {
            Ok(val) => {
                let ms = val
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "SPECIMEN_TICK_INTERVAL_MS".to_string(),
                        message: format!("expected positive integer, got '{val}'"),
                    })?;
                if ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "SPECIMEN_TICK_INTERVAL_MS".to_string(),
                        message: "tick interval must be greater than 0".to_string(),
                    });
                }
                ms
            }
            Err(_) => DEFAULT_TICK_INTERVAL_MS,
        };

        Ok(Self {
            timeout_minutes,
            show_notifications,
            never_reset_lamps,
            tick_interval_ms,
        })
    }

    /// The options the session tracker reads.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            timeout_minutes: self.timeout_minutes,
            show_notifications: self.show_notifications,
            never_reset_lamps: self.never_reset_lamps,
        }
    }
}

/// Reads an optional boolean environment variable.
fn bool_var(key: &str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(val) => parse_bool(&val).ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean, got '{val}'"),
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
