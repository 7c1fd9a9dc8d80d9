//! Error types for the Specimen Tracker.
//!
//! The tracking core itself has no recoverable failures; these errors come
//! from the surrounding hosts (configuration, feed parsing, file tailing).

use thiserror::Error;

use crate::config::ConfigError;
use crate::feed::FeedError;
use crate::watcher::WatcherError;

/// Errors that can occur while hosting the tracker.
///
/// # Examples
///
/// ```
/// use specimen_tracker::error::Result;
/// use specimen_tracker::feed::replay;
/// use specimen_tracker::session::SessionConfig;
///
/// fn replay_file(path: &str) -> Result<u32> {
///     let contents = std::fs::read_to_string(path)?;
///     let outcome = replay(&contents, SessionConfig::default())?;
///     Ok(outcome.stats.antique_lamp_count)
/// }
/// ```
#[derive(Error, Debug)]
pub enum TrackerError {
    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Host feed error.
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    /// File watching error.
    #[error("file watch error: {0}")]
    Watch(#[from] WatcherError),
}

/// A specialized `Result` type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;
