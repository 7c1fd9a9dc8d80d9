//! Spatial zone in which cleaning activity is tracked.
//!
//! A [`Zone`] is the conjunction of a region allowlist and two inclusive
//! coordinate ranges. The default zone covers the specimen cleaning tables
//! in the Varrock Museum basement.

use std::ops::RangeInclusive;

use crate::types::{ActorPosition, GameState};

/// The museum's specimen cleaning area.
pub const MUSEUM_CLEANING_AREA: Zone = Zone::new(&[12853, 13109], 3253..=3267, 3442..=3446);

/// A region + coordinate box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    regions: &'static [u32],
    x: RangeInclusive<i32>,
    y: RangeInclusive<i32>,
}

impl Zone {
    #[must_use]
    pub const fn new(
        regions: &'static [u32],
        x: RangeInclusive<i32>,
        y: RangeInclusive<i32>,
    ) -> Self {
        Self { regions, x, y }
    }

    /// Returns true iff the region is eligible and both coordinates are in range.
    ///
    /// # Example
    ///
    /// ```
    /// use specimen_tracker::types::ActorPosition;
    /// use specimen_tracker::zone::MUSEUM_CLEANING_AREA;
    ///
    /// assert!(MUSEUM_CLEANING_AREA.contains(&ActorPosition::from_world(3260, 3444)));
    /// assert!(!MUSEUM_CLEANING_AREA.contains(&ActorPosition::from_world(3260, 3450)));
    /// ```
    #[must_use]
    pub fn contains(&self, position: &ActorPosition) -> bool {
        self.regions.contains(&position.region_id)
            && self.x.contains(&position.x)
            && self.y.contains(&position.y)
    }

    #[must_use]
    pub fn regions(&self) -> &'static [u32] {
        self.regions
    }
}

impl Default for Zone {
    fn default() -> Self {
        MUSEUM_CLEANING_AREA
    }
}

/// Zone membership guarded by the client's connectivity state.
///
/// Outside `LoggedIn`/`Loading`, or without a position, the actor is never
/// considered in the zone.
#[must_use]
pub fn is_in_zone(zone: &Zone, game_state: GameState, position: Option<ActorPosition>) -> bool {
    if !game_state.has_position() {
        return false;
    }

    position.is_some_and(|position| zone.contains(&position))
}
