//! Domain types for specimen cleaning tracking.
//!
//! This module defines the item identities the tracker cares about, the
//! progress categories they are classified into, and the host-side values
//! (container ids, game state, actor position) the detector reads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A game item identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u32);

impl ItemId {
    pub const UNCLEANED_FIND: ItemId = ItemId(11175);
    pub const ARROWHEADS: ItemId = ItemId(11176);
    pub const JEWELLERY: ItemId = ItemId(11177);
    pub const POTTERY: ItemId = ItemId(11178);
    pub const OLD_CHIPPED_VASE: ItemId = ItemId(11183);
    pub const ANTIQUE_LAMP_11185: ItemId = ItemId(11185);
    pub const ANTIQUE_LAMP_11186: ItemId = ItemId(11186);
    pub const ANTIQUE_LAMP_11187: ItemId = ItemId(11187);
    pub const ANTIQUE_LAMP_11188: ItemId = ItemId(11188);
    pub const ANTIQUE_LAMP_11189: ItemId = ItemId(11189);

    /// Returns true if this item is part of the trackable item set.
    #[must_use]
    pub fn is_tracked(self) -> bool {
        Category::of(self).is_some()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every item identity the tracker observes. Anything else in a container is
/// ignored.
pub const TRACKED_ITEMS: [ItemId; 10] = [
    ItemId::UNCLEANED_FIND,
    ItemId::ARROWHEADS,
    ItemId::JEWELLERY,
    ItemId::POTTERY,
    ItemId::OLD_CHIPPED_VASE,
    ItemId::ANTIQUE_LAMP_11185,
    ItemId::ANTIQUE_LAMP_11186,
    ItemId::ANTIQUE_LAMP_11187,
    ItemId::ANTIQUE_LAMP_11188,
    ItemId::ANTIQUE_LAMP_11189,
];

/// Progress category a tracked item is counted under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Primary find: the uncleaned find dug out of the specimen rocks.
    UncleanedFind,
    /// One of the four artefacts produced by cleaning a find.
    Artefact,
    /// Rare reward: any of the five antique lamp variants.
    AntiqueLamp,
}

impl Category {
    /// Classifies an item identity, returning `None` for untracked items.
    ///
    /// # Example
    ///
    /// ```
    /// use specimen_tracker::types::{Category, ItemId};
    ///
    /// assert_eq!(Category::of(ItemId::POTTERY), Some(Category::Artefact));
    /// assert_eq!(Category::of(ItemId::ANTIQUE_LAMP_11187), Some(Category::AntiqueLamp));
    /// assert_eq!(Category::of(ItemId(995)), None);
    /// ```
    #[must_use]
    pub fn of(item: ItemId) -> Option<Self> {
        match item {
            ItemId::UNCLEANED_FIND => Some(Category::UncleanedFind),
            ItemId::ARROWHEADS
            | ItemId::JEWELLERY
            | ItemId::POTTERY
            | ItemId::OLD_CHIPPED_VASE => Some(Category::Artefact),
            ItemId::ANTIQUE_LAMP_11185
            | ItemId::ANTIQUE_LAMP_11186
            | ItemId::ANTIQUE_LAMP_11187
            | ItemId::ANTIQUE_LAMP_11188
            | ItemId::ANTIQUE_LAMP_11189 => Some(Category::AntiqueLamp),
            _ => None,
        }
    }
}

/// A stack of items in a container slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub id: ItemId,
    pub quantity: u32,
}

impl ItemStack {
    #[must_use]
    pub fn new(id: ItemId, quantity: u32) -> Self {
        Self { id, quantity }
    }
}

/// Identifies which item container a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u32);

impl ContainerId {
    /// The player's personal inventory.
    pub const INVENTORY: ContainerId = ContainerId(93);
    pub const EQUIPMENT: ContainerId = ContainerId(94);
    pub const BANK: ContainerId = ContainerId(95);
}

/// Connectivity state of the host client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    #[default]
    Unknown,
    Starting,
    LoginScreen,
    LoginScreenAuthenticator,
    LoggingIn,
    Loading,
    LoggedIn,
    ConnectionLost,
    Hopping,
}

impl GameState {
    /// Returns true when the client has a valid local player position.
    ///
    /// Only `LoggedIn` and `Loading` qualify; in every other state the
    /// position is stale or undefined.
    #[must_use]
    pub fn has_position(self) -> bool {
        matches!(self, GameState::LoggedIn | GameState::Loading)
    }
}

/// Where the local player is standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorPosition {
    pub region_id: u32,
    pub x: i32,
    pub y: i32,
}

impl ActorPosition {
    #[must_use]
    pub fn new(region_id: u32, x: i32, y: i32) -> Self {
        Self { region_id, x, y }
    }

    /// Builds a position from world coordinates, deriving the 64x64 region id
    /// the same way the game client does.
    ///
    /// # Example
    ///
    /// ```
    /// use specimen_tracker::types::ActorPosition;
    ///
    /// let position = ActorPosition::from_world(3260, 3444);
    /// assert_eq!(position.region_id, 12853);
    /// ```
    #[must_use]
    pub fn from_world(x: i32, y: i32) -> Self {
        let region_id = (((x >> 6) << 8) | (y >> 6)) as u32;
        Self { region_id, x, y }
    }
}
