//! Component kinds and the per-entity capability bitset.
//!
//! Every component type has a [`ComponentKind`] tag, and every live entity
//! carries a [`KindMask`] — the set of kinds currently attached to it. Family
//! (archetype) matching is a subset check against that mask, replacing
//! per-field presence probing with an explicit capability set.

use serde::{Deserialize, Serialize};

/// The closed set of component kinds known to this version of the game.
///
/// The discriminant doubles as the bit index inside a [`KindMask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ComponentKind {
    /// World-space position.
    Position = 0,
    /// Linear velocity.
    Velocity = 1,
    /// Look orientation (yaw/pitch).
    Rotation = 2,
    /// Hit points.
    Health = 3,
    /// Weapon state and per-weapon ammo.
    Shooter = 4,
    /// Tags an entity as a player record.
    Player = 5,
    /// Tags an entity as a player's in-world avatar.
    Avatar = 6,
}

impl ComponentKind {
    /// All kinds, in bit order.
    pub const ALL: [ComponentKind; 7] = [
        ComponentKind::Position,
        ComponentKind::Velocity,
        ComponentKind::Rotation,
        ComponentKind::Health,
        ComponentKind::Shooter,
        ComponentKind::Player,
        ComponentKind::Avatar,
    ];

    /// The single-bit mask for this kind.
    #[must_use]
    pub const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

/// A set of [`ComponentKind`]s packed into a `u32` bitset.
///
/// Used both as an entity's attached-kind set and as a family's required-kind
/// archetype; `contains_all` is the family membership test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KindMask(u32);

impl KindMask {
    /// The empty set.
    pub const EMPTY: KindMask = KindMask(0);

    /// Build a mask from a list of kinds.
    #[must_use]
    pub fn of(kinds: &[ComponentKind]) -> Self {
        let mut mask = Self::EMPTY;
        for &kind in kinds {
            mask.insert(kind);
        }
        mask
    }

    /// Add a kind to the set.
    pub fn insert(&mut self, kind: ComponentKind) {
        self.0 |= kind.bit();
    }

    /// Remove a kind from the set.
    pub fn remove(&mut self, kind: ComponentKind) {
        self.0 &= !kind.bit();
    }

    /// Returns `true` if the kind is in the set.
    #[must_use]
    pub const fn contains(self, kind: ComponentKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Returns `true` if every kind in `required` is also in `self`.
    ///
    /// This is the archetype membership test: an entity mask qualifies for a
    /// family exactly when it contains all of the family's required kinds.
    #[must_use]
    pub const fn contains_all(self, required: KindMask) -> bool {
        self.0 & required.0 == required.0
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the kinds present in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = ComponentKind> {
        ComponentKind::ALL
            .into_iter()
            .filter(move |&kind| self.contains(kind))
    }
}

impl FromIterator<ComponentKind> for KindMask {
    fn from_iter<I: IntoIterator<Item = ComponentKind>>(iter: I) -> Self {
        let mut mask = Self::EMPTY;
        for kind in iter {
            mask.insert(kind);
        }
        mask
    }
}
