//! Feeding economy: the inventory, offering generation, and feed deltas.
//!
//! Generation is split in two so the store can release its lock while the
//! narrative collaborator writes a description: [`roll_offering`] decides
//! the hidden kind and icon up front, and [`Inventory::push`] re-checks
//! capacity when the finished offering is committed.

use gloomling_types::{Offering, OfferingId, OfferingKind, OfferingView};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::evolution::{StageTransition, transition};
use crate::rules::{
    DAILY_FEED_ALLOWANCE, FEED_HUNGER_RELIEF, INVENTORY_CAPACITY, OVERFEED_SANITY_PENALTY,
    PURITY_CORRUPTION_LOSS, PURITY_SANITY_GAIN, ROT_CORRUPTION_GAIN, ROT_SANITY_LOSS,
};
use crate::vitals::{Vitals, lower, raise};

/// Icons shown on offerings. Deliberately unrelated to the kind.
pub const ICON_POOL: &[&str] = &[
    "\u{1F9B4}", // bone
    "\u{1F344}", // mushroom
    "\u{1FAC0}", // heart
    "\u{1F56F}", // candle
    "\u{1FAB2}", // beetle
    "\u{1F940}", // wilted flower
    "\u{1F9FF}", // charm
    "\u{1FA78}", // drop of blood
    "\u{1F311}", // new moon
    "\u{1F95A}", // egg
];

/// Errors raised when rebuilding an inventory from stored items.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// More items than [`INVENTORY_CAPACITY`].
    #[error("inventory holds {count} items, capacity is {INVENTORY_CAPACITY}")]
    OverCapacity {
        /// Number of items supplied.
        count: usize,
    },

    /// Two items share an id.
    #[error("duplicate offering id {0}")]
    DuplicateId(OfferingId),
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Ordered offerings, never more than [`INVENTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Offering>", into = "Vec<Offering>")]
pub struct Inventory {
    items: Vec<Offering>,
}

impl Inventory {
    /// An empty inventory.
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Rebuild an inventory, enforcing capacity and id uniqueness.
    pub fn from_items(items: Vec<Offering>) -> Result<Self, InventoryError> {
        if items.len() > INVENTORY_CAPACITY {
            return Err(InventoryError::OverCapacity { count: items.len() });
        }
        for (i, item) in items.iter().enumerate() {
            if items.iter().skip(i.saturating_add(1)).any(|o| o.id == item.id) {
                return Err(InventoryError::DuplicateId(item.id));
            }
        }
        Ok(Self { items })
    }

    /// Number of held offerings.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether another offering would exceed capacity.
    pub fn is_full(&self) -> bool {
        self.items.len() >= INVENTORY_CAPACITY
    }

    /// Held offerings, oldest first.
    pub fn items(&self) -> &[Offering] {
        &self.items
    }

    /// Whether an offering with this id is held.
    pub fn contains(&self, id: OfferingId) -> bool {
        self.items.iter().any(|o| o.id == id)
    }

    /// Append an offering. Hands it back if the inventory is full.
    pub fn push(&mut self, offering: Offering) -> Result<(), Offering> {
        if self.is_full() {
            return Err(offering);
        }
        self.items.push(offering);
        Ok(())
    }

    /// Remove and return the offering with this id.
    pub fn take(&mut self, id: OfferingId) -> Option<Offering> {
        let index = self.items.iter().position(|o| o.id == id)?;
        Some(self.items.remove(index))
    }

    /// Presentation views, kinds stripped.
    pub fn views(&self) -> Vec<OfferingView> {
        self.items.iter().map(OfferingView::from).collect()
    }
}

impl TryFrom<Vec<Offering>> for Inventory {
    type Error = InventoryError;

    fn try_from(items: Vec<Offering>) -> Result<Self, Self::Error> {
        Self::from_items(items)
    }
}

impl From<Inventory> for Vec<Offering> {
    fn from(inventory: Inventory) -> Self {
        inventory.items
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The random half of an offering, decided before its description exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferingRoll {
    /// Hidden nature, 50/50.
    pub kind: OfferingKind,
    /// Display glyph, independent of `kind`.
    pub icon: &'static str,
}

impl OfferingRoll {
    /// Finish the offering with a description and a fresh id.
    pub fn into_offering(self, description: String) -> Offering {
        Offering {
            id: OfferingId::new(),
            kind: self.kind,
            description,
            icon: self.icon.to_owned(),
        }
    }
}

/// Choose a kind with equal probability.
pub fn roll_kind(rng: &mut impl Rng) -> OfferingKind {
    if rng.random_range(0..2_u8) == 0 {
        OfferingKind::Purity
    } else {
        OfferingKind::Rot
    }
}

/// Choose an icon uniformly from [`ICON_POOL`].
pub fn pick_icon(rng: &mut impl Rng) -> &'static str {
    let index = rng.random_range(0..ICON_POOL.len());
    ICON_POOL.get(index).copied().unwrap_or("?")
}

/// Roll kind and icon. The two draws are independent.
pub fn roll_offering(rng: &mut impl Rng) -> OfferingRoll {
    let kind = roll_kind(rng);
    let icon = pick_icon(rng);
    OfferingRoll { kind, icon }
}

// ---------------------------------------------------------------------------
// Consumption
// ---------------------------------------------------------------------------

/// Result of applying an offering to the pet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedEffect {
    /// Vitals after the offering.
    pub next: Vitals,
    /// True if the overfeeding penalty applied.
    pub overfed: bool,
    /// Stage change caused by the corruption re-check.
    pub transition: Option<StageTransition>,
}

/// Apply one offering of `kind` to `vitals`.
///
/// Each stat is clamped on its own. The feed counter is incremented first,
/// so the penalty applies from the fourth feed of the day onwards.
pub fn apply_offering(vitals: &Vitals, kind: OfferingKind) -> FeedEffect {
    let mut next = *vitals;
    let stats = &mut next.stats;

    stats.hunger = lower(stats.hunger, FEED_HUNGER_RELIEF);
    match kind {
        OfferingKind::Purity => {
            stats.sanity = raise(stats.sanity, PURITY_SANITY_GAIN);
            stats.corruption = lower(stats.corruption, PURITY_CORRUPTION_LOSS);
        }
        OfferingKind::Rot => {
            stats.sanity = lower(stats.sanity, ROT_SANITY_LOSS);
            stats.corruption = raise(stats.corruption, ROT_CORRUPTION_GAIN);
        }
    }

    next.counters.daily_feeds = next.counters.daily_feeds.saturating_add(1);
    let overfed = next.counters.daily_feeds > DAILY_FEED_ALLOWANCE;
    if overfed {
        next.stats.sanity = lower(next.stats.sanity, OVERFEED_SANITY_PENALTY);
    }

    let stage_change = transition(next.stage, next.age, next.stats.corruption);
    if let Some(t) = stage_change {
        next.stage = t.to;
    }

    FeedEffect {
        next,
        overfed,
        transition: stage_change,
    }
}
