//! Specimen Tracker - museum specimen cleaning session tracker.
//!
//! This crate counts what a player obtains while cleaning finds in the
//! Varrock Museum basement and resets the tally after a period of inactivity.
//!
//! # Overview
//!
//! The host posts inventory container changes and game ticks to an
//! [`EventBus`]. A started [`SpecimenCleaningPlugin`] listens on that bus,
//! diffs successive inventory snapshots while the player stands in the
//! cleaning area, and credits each newly gained unit to its category.
//! Antique lamps raise a chat notification. Ticks drive the idle timeout.
//!
//! Delivery is serial and single-threaded; nothing here blocks or spawns.
//!
//! # Modules
//!
//! - [`types`]: Item ids, categories, game state and positions
//! - [`zone`]: The cleaning area and the in-zone test
//! - [`detector`]: Snapshot diffing
//! - [`session`]: Counters, idle timeout and reset
//! - [`notification`]: Chat notifications and sinks
//! - [`events`]: Host events and the subscription bus
//! - [`plugin`]: The plugin controller wiring it all together
//! - [`client`] and [`clock`]: Host-provided queries
//! - [`config`]: Configuration from environment variables
//! - [`feed`]: JSON Lines host feed and replay
//! - [`watcher`]: File tailer for a live feed
//! - [`error`]: Error types for host operations

pub mod client;
pub mod clock;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod feed;
pub mod notification;
pub mod plugin;
pub mod session;
pub mod types;
pub mod watcher;
pub mod zone;

pub use client::Client;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, ConfigError};
pub use detector::{compute_delta, snapshot_of, Delta, InventoryDetector, Snapshot};
pub use error::{Result, TrackerError};
pub use events::{EventBus, EventKind, GameTick, HostEvent, ItemContainerChanged, SubscriptionId};
pub use feed::{
    replay, replay_with, FeedDriver, FeedError, FeedRecord, ReplayOutcome, ScriptedClient,
};
pub use notification::{Notification, NotificationLog, Notifier};
pub use plugin::SpecimenCleaningPlugin;
pub use session::{Session, SessionConfig, SessionState, SessionStats};
pub use types::{ActorPosition, Category, ContainerId, GameState, ItemId, ItemStack, TRACKED_ITEMS};
pub use watcher::{FeedWatcher, WatcherError};
pub use zone::{is_in_zone, Zone, MUSEUM_CLEANING_AREA};
