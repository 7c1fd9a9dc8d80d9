//! Session tracker: per-category counters with an idle-timeout reset.
//!
//! A session is **Active** while it has a last-action timestamp and **Idle**
//! otherwise. Any non-empty delta makes it Active and refreshes the
//! timestamp; a reset (idle timeout or manual) returns it to Idle.
//!
//! ```text
//!            non-empty delta                  non-empty delta
//!   +------+ ----------------> +--------+ <-------------------+
//!   | Idle |                   | Active |                     |
//!   +------+ <---------------- +--------+ --------------------+
//!            timeout / reset
//! ```
//!
//! # Example
//!
//! ```
//! use chrono::{Duration, Utc};
//! use specimen_tracker::detector::Delta;
//! use specimen_tracker::notification::Notification;
//! use specimen_tracker::session::{Session, SessionConfig, SessionState};
//! use specimen_tracker::types::ItemId;
//!
//! let mut session = Session::new(SessionConfig::default());
//! let mut sent: Vec<Notification> = Vec::new();
//! let now = Utc::now();
//!
//! let delta: Delta = [(ItemId::ANTIQUE_LAMP_11185, 1)].into_iter().collect();
//! session.record_delta(&delta, now, &mut sent);
//!
//! assert_eq!(session.antique_lamp_count(), 1);
//! assert_eq!(session.state(), SessionState::Active);
//! assert_eq!(sent, vec![Notification::AntiqueLampFound]);
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::detector::Delta;
use crate::notification::{Notification, Notifier};
use crate::types::{Category, ItemId};

/// Default idle timeout in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 5;

/// Options read by the session on every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Minutes of inactivity before an automatic reset. Zero disables it.
    pub timeout_minutes: u32,

    /// Emit chat notifications for lamps and resets.
    pub show_notifications: bool,

    /// Keep the antique lamp counter across resets.
    pub never_reset_lamps: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            show_notifications: true,
            never_reset_lamps: false,
        }
    }
}

impl SessionConfig {
    /// The idle timeout, or `None` when automatic reset is disabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_minutes > 0).then(|| Duration::minutes(i64::from(self.timeout_minutes)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Active,
}

/// Read-only view of a session for display overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub uncleaned_find_count: u32,
    pub artefact_count: u32,
    pub antique_lamp_count: u32,
    pub last_action_time: Option<DateTime<Utc>>,
    pub state: SessionState,
}

/// Counters for one cleaning session.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    uncleaned_find_count: u32,
    artefact_count: u32,
    antique_lamp_count: u32,
    last_action_time: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            uncleaned_find_count: 0,
            artefact_count: 0,
            antique_lamp_count: 0,
            last_action_time: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> SessionConfig {
        self.config
    }

    /// Replaces the options. They apply from the next event on.
    pub fn set_config(&mut self, config: SessionConfig) {
        self.config = config;
    }

    #[must_use]
    pub fn uncleaned_find_count(&self) -> u32 {
        self.uncleaned_find_count
    }

    #[must_use]
    pub fn artefact_count(&self) -> u32 {
        self.artefact_count
    }

    #[must_use]
    pub fn antique_lamp_count(&self) -> u32 {
        self.antique_lamp_count
    }

    #[must_use]
    pub fn last_action_time(&self) -> Option<DateTime<Utc>> {
        self.last_action_time
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.last_action_time.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            uncleaned_find_count: self.uncleaned_find_count,
            artefact_count: self.artefact_count,
            antique_lamp_count: self.antique_lamp_count,
            last_action_time: self.last_action_time,
            state: self.state(),
        }
    }

    /// Counts a single obtained unit of `item`.
    ///
    /// Returns the category it was counted under, or `None` for an untracked
    /// item. A lamp triggers a notification when notifications are enabled.
    pub fn increment_item_obtained<N>(&mut self, item: ItemId, notifier: &mut N) -> Option<Category>
    where
        N: Notifier + ?Sized,
    {
        self.credit(item, 1, notifier)
    }

    /// Counts `quantity` units of `item` in one step.
    ///
    /// Lamps still notify once per unit.
    fn credit<N>(&mut self, item: ItemId, quantity: u32, notifier: &mut N) -> Option<Category>
    where
        N: Notifier + ?Sized,
    {
        let category = Category::of(item)?;

        match category {
            Category::UncleanedFind => {
                self.uncleaned_find_count = self.uncleaned_find_count.saturating_add(quantity);
            }
            Category::Artefact => {
                self.artefact_count = self.artefact_count.saturating_add(quantity);
            }
            Category::AntiqueLamp => {
                self.antique_lamp_count = self.antique_lamp_count.saturating_add(quantity);

                if self.config.show_notifications {
                    for _ in 0..quantity {
                        notifier.notify(Notification::AntiqueLampFound);
                    }
                }
            }
        }

        debug!(item = %item, quantity, category = ?category, "Item obtained");
        Some(category)
    }

    /// Classifies every gained unit in `delta` and stamps the action time.
    ///
    /// The timestamp is set once per call, and only for a non-empty delta.
    /// Returns the number of units counted.
    pub fn record_delta<N>(&mut self, delta: &Delta, now: DateTime<Utc>, notifier: &mut N) -> u64
    where
        N: Notifier + ?Sized,
    {
        if delta.is_empty() {
            return 0;
        }

        let mut counted = 0;
        for (item, quantity) in delta.iter() {
            if self.credit(item, quantity, notifier).is_some() {
                counted += u64::from(quantity);
            }
        }

        self.last_action_time = Some(now);

        debug!(
            counted,
            uncleaned_finds = self.uncleaned_find_count,
            artefacts = self.artefact_count,
            antique_lamps = self.antique_lamp_count,
            "Recorded inventory gains"
        );

        counted
    }

    /// Resets the session if it has been idle for at least the timeout.
    ///
    /// Returns true if a reset happened.
    pub fn check_idle<N>(&mut self, now: DateTime<Utc>, notifier: &mut N) -> bool
    where
        N: Notifier + ?Sized,
    {
        let Some(timeout) = self.config.timeout() else {
            return false;
        };
        let Some(last_action) = self.last_action_time else {
            return false;
        };

        let idle_for = now - last_action;
        if idle_for < timeout {
            return false;
        }

        info!(
            idle_secs = idle_for.num_seconds(),
            timeout_minutes = self.config.timeout_minutes,
            "Session idle timeout reached"
        );
        self.reset(notifier);
        true
    }

    /// Clears the session.
    ///
    /// The antique lamp counter survives when `never_reset_lamps` is set.
    pub fn reset<N>(&mut self, notifier: &mut N)
    where
        N: Notifier + ?Sized,
    {
        self.last_action_time = None;
        self.uncleaned_find_count = 0;
        self.artefact_count = 0;

        if !self.config.never_reset_lamps {
            self.antique_lamp_count = 0;
        }

        info!(
            antique_lamps = self.antique_lamp_count,
            kept_lamps = self.config.never_reset_lamps,
            "Specimen cleaning tracker reset"
        );

        if self.config.show_notifications {
            notifier.notify(Notification::TrackerReset);
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
