//! JSON Lines host feed.
//!
//! The bundled CLI stands in for a game client by reading a feed of host
//! records, one JSON object per line, tagged by `type`:
//!
//! ```json
//! {"type":"game_state","at":"2026-01-01T12:00:00Z","state":"logged_in"}
//! {"type":"position","at":"2026-01-01T12:00:00Z","x":3260,"y":3444}
//! {"type":"container_changed","at":"2026-01-01T12:00:01Z","container":93,"items":[{"id":11175,"quantity":3}]}
//! {"type":"tick","at":"2026-01-01T12:00:02Z"}
//! ```
//!
//! `game_state` and `position` records update a [`ScriptedClient`];
//! `container_changed` and `tick` records are posted to the [`EventBus`].
//!
//! # Example
//!
//! ```
//! use specimen_tracker::feed::replay;
//! use specimen_tracker::session::SessionConfig;
//!
//! let feed = r#"
//! {"type":"game_state","at":"2026-01-01T12:00:00Z","state":"logged_in"}
//! {"type":"position","at":"2026-01-01T12:00:00Z","x":3260,"y":3444}
//! {"type":"container_changed","at":"2026-01-01T12:00:01Z","container":93,"items":[]}
//! {"type":"container_changed","at":"2026-01-01T12:00:05Z","container":93,"items":[{"id":11175,"quantity":2}]}
//! "#;
//!
//! let outcome = replay(feed, SessionConfig::default()).unwrap();
//! assert_eq!(outcome.stats.uncleaned_find_count, 2);
//! ```

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::clock::ManualClock;
use crate::events::{EventBus, GameTick, HostEvent, ItemContainerChanged};
use crate::notification::{Notification, NotificationLog, Notifier};
use crate::plugin::SpecimenCleaningPlugin;
use crate::session::{SessionConfig, SessionStats};
use crate::types::{ActorPosition, ContainerId, GameState, ItemStack};

/// Errors that can occur while reading a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    /// A line is not a valid feed record.
    #[error("invalid feed record on line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Replays need a timestamp on every record to drive the clock.
    #[error("feed record on line {line} has no timestamp")]
    MissingTimestamp { line: usize },
}

/// One host record.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedRecord {
    GameState {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
        state: GameState,
    },
    Position {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
        x: i32,
        y: i32,
        /// Overrides the region derived from `x`/`y`.
        #[serde(default)]
        region: Option<u32>,
    },
    /// The player has no position, e.g. mid-load.
    PositionLost {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
    ContainerChanged {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
        container: ContainerId,
        #[serde(default)]
        items: Vec<ItemStack>,
    },
    Tick {
        #[serde(default)]
        at: Option<DateTime<Utc>>,
    },
}

impl FeedRecord {
    /// When the record happened, if the feed says.
    #[must_use]
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            FeedRecord::GameState { at, .. }
            | FeedRecord::Position { at, .. }
            | FeedRecord::PositionLost { at }
            | FeedRecord::ContainerChanged { at, .. }
            | FeedRecord::Tick { at } => *at,
        }
    }
}

/// Parses line number `line` of a feed. Blank lines yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`FeedError::Json`] if the line is not a valid record.
pub fn parse_record(line: usize, content: &str) -> Result<Option<FeedRecord>, FeedError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| FeedError::Json { line, source })
}

/// Parses a whole feed, skipping malformed lines.
///
/// Returns `(line_number, record)` pairs; line numbers start at 1.
#[must_use]
pub fn parse_feed_lenient(content: &str) -> Vec<(usize, FeedRecord)> {
    content
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match parse_record(index + 1, line) {
            Ok(record) => record.map(|record| (index + 1, record)),
            Err(e) => {
                warn!(error = %e, "Skipping malformed feed record");
                None
            }
        })
        .collect()
}

/// A [`Client`] whose answers are set by the feed. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedClient {
    game_state: Rc<Cell<GameState>>,
    position: Rc<Cell<Option<ActorPosition>>>,
}

impl ScriptedClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_game_state(&self, state: GameState) {
        self.game_state.set(state);
    }

    pub fn set_position(&self, position: Option<ActorPosition>) {
        self.position.set(position);
    }
}

impl Client for ScriptedClient {
    fn game_state(&self) -> GameState {
        self.game_state.get()
    }

    fn local_player_position(&self) -> Option<ActorPosition> {
        self.position.get()
    }
}

/// Applies feed records to a scripted client and an event bus.
#[derive(Debug)]
pub struct FeedDriver {
    client: ScriptedClient,
    bus: EventBus,
}

impl FeedDriver {
    #[must_use]
    pub fn new(client: ScriptedClient) -> Self {
        Self {
            client,
            bus: EventBus::new(),
        }
    }

    #[must_use]
    pub fn client(&self) -> &ScriptedClient {
        &self.client
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Applies one record.
    pub fn apply(&mut self, record: FeedRecord) {
        match record {
            FeedRecord::GameState { state, .. } => {
                debug!(?state, "Game state changed");
                self.client.set_game_state(state);
            }
            FeedRecord::Position { x, y, region, .. } => {
                let position = match region {
                    Some(region_id) => ActorPosition::new(region_id, x, y),
                    None => ActorPosition::from_world(x, y),
                };
                self.client.set_position(Some(position));
            }
            FeedRecord::PositionLost { .. } => {
                self.client.set_position(None);
            }
            FeedRecord::ContainerChanged {
                container, items, ..
            } => {
                self.bus
                    .post(&HostEvent::ItemContainerChanged(ItemContainerChanged {
                        container_id: container,
                        items,
                    }));
            }
            FeedRecord::Tick { .. } => {
                self.bus.post(&HostEvent::GameTick(GameTick));
            }
        }
    }
}

/// Result of replaying a recorded feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Session state after the last record.
    pub stats: SessionStats,

    /// Every notification emitted, in order.
    pub notifications: Vec<Notification>,

    /// Number of records applied.
    pub records: usize,
}

/// Replays a recorded feed through a fresh plugin.
///
/// Each record's `at` drives a manual clock before the record is applied.
/// Malformed lines are skipped.
///
/// # Errors
///
/// Returns [`FeedError::MissingTimestamp`] if a record has no `at`.
pub fn replay(content: &str, config: SessionConfig) -> Result<ReplayOutcome, FeedError> {
    replay_with(content, config, NotificationLog::new())
}

/// Like [`replay`], additionally forwarding every notification to `forward`.
///
/// # Errors
///
/// Returns [`FeedError::MissingTimestamp`] if a record has no `at`.
pub fn replay_with<N>(
    content: &str,
    config: SessionConfig,
    mut forward: N,
) -> Result<ReplayOutcome, FeedError>
where
    N: Notifier + 'static,
{
    let records = parse_feed_lenient(content);

    // Validate up front so a bad record never leaves a half-applied replay
    if let Some((line, _)) = records.iter().find(|(_, record)| record.at().is_none()) {
        return Err(FeedError::MissingTimestamp { line: *line });
    }

    let clock = ManualClock::new(DateTime::<Utc>::UNIX_EPOCH);
    let log = NotificationLog::new();
    let mut driver = FeedDriver::new(ScriptedClient::new());
    let mut plugin =
        SpecimenCleaningPlugin::new(driver.client().clone(), clock.clone(), log.clone(), config);
    plugin.start(driver.bus_mut());

    let mut notifications = Vec::new();
    let count = records.len();
    for (_, record) in records {
        if let Some(at) = record.at() {
            clock.set(at);
        }
        driver.apply(record);

        for notification in log.drain() {
            forward.notify(notification);
            notifications.push(notification);
        }
    }

    plugin.stop(driver.bus_mut());
    let stats = plugin.stats();

    info!(
        records = count,
        uncleaned_finds = stats.uncleaned_find_count,
        artefacts = stats.artefact_count,
        antique_lamps = stats.antique_lamp_count,
        "Replay finished"
    );

    Ok(ReplayOutcome {
        stats,
        notifications,
        records: count,
    })
}
