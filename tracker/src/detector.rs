//! Inventory delta detection.
//!
//! The detector keeps the last observed snapshot of trackable items and, on
//! each new observation, reports what was gained since then. Decreases are
//! never reported: a delta is one-directional.
//!
//! # Example
//!
//! ```
//! use specimen_tracker::detector::InventoryDetector;
//! use specimen_tracker::types::{ItemId, ItemStack};
//!
//! let mut detector = InventoryDetector::new();
//!
//! // The first observation only establishes a baseline.
//! let delta = detector.observe(&[ItemStack::new(ItemId::UNCLEANED_FIND, 2)]);
//! assert!(delta.is_empty());
//!
//! let delta = detector.observe(&[ItemStack::new(ItemId::UNCLEANED_FIND, 5)]);
//! assert_eq!(delta.get(ItemId::UNCLEANED_FIND), 3);
//! ```

use std::collections::BTreeMap;

use tracing::trace;

use crate::types::{ItemId, ItemStack};

/// Held quantity per trackable item identity.
pub type Snapshot = BTreeMap<ItemId, u32>;

/// Per-identity quantity gained between two snapshots.
///
/// Only strictly positive entries are stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    gained: BTreeMap<ItemId, u32>,
}

impl Delta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gained.is_empty()
    }

    /// Quantity gained for `item`, zero if absent.
    #[must_use]
    pub fn get(&self, item: ItemId) -> u32 {
        self.gained.get(&item).copied().unwrap_or(0)
    }

    /// Iterates `(item, quantity)` pairs in item id order.
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.gained.iter().map(|(&item, &qty)| (item, qty))
    }

    /// Total number of units gained across all items.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.gained.values().copied().map(u64::from).sum()
    }
}

impl FromIterator<(ItemId, u32)> for Delta {
    fn from_iter<I: IntoIterator<Item = (ItemId, u32)>>(iter: I) -> Self {
        let mut gained = BTreeMap::new();
        for (item, quantity) in iter {
            if quantity > 0 {
                *gained.entry(item).or_insert(0) += quantity;
            }
        }
        Self { gained }
    }
}

/// Builds a snapshot from raw container contents, keeping trackable items only.
///
/// Several stacks of the same item are summed.
#[must_use]
pub fn snapshot_of(items: &[ItemStack]) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for stack in items.iter().filter(|stack| stack.id.is_tracked()) {
        let held = snapshot.entry(stack.id).or_insert(0);
        *held = held.saturating_add(stack.quantity);
    }
    snapshot
}

/// Computes `max(0, current - previous)` for every item in `current`.
#[must_use]
pub fn compute_delta(previous: &Snapshot, current: &Snapshot) -> Delta {
    current
        .iter()
        .map(|(item, quantity)| {
            let before = previous.get(item).copied().unwrap_or(0);
            (*item, quantity.saturating_sub(before))
        })
        .collect()
}

/// Tracks the previous snapshot and turns container contents into deltas.
#[derive(Debug, Clone, Default)]
pub struct InventoryDetector {
    last_snapshot: Option<Snapshot>,
}

impl InventoryDetector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records new container contents and returns what was gained.
    ///
    /// With no baseline yet, the contents become the baseline and the delta
    /// is empty. The stored snapshot is always replaced.
    pub fn observe(&mut self, items: &[ItemStack]) -> Delta {
        let current = snapshot_of(items);

        let delta = match &self.last_snapshot {
            Some(previous) => compute_delta(previous, &current),
            None => {
                trace!(
                    items = current.len(),
                    "Captured baseline inventory snapshot"
                );
                Delta::default()
            }
        };

        self.last_snapshot = Some(current);
        delta
    }

    /// Forgets the baseline so the next observation is treated as the first.
    pub fn clear_baseline(&mut self) {
        self.last_snapshot = None;
    }

    #[must_use]
    pub fn has_baseline(&self) -> bool {
        self.last_snapshot.is_some()
    }

    #[must_use]
    pub fn baseline(&self) -> Option<&Snapshot> {
        self.last_snapshot.as_ref()
    }
}
