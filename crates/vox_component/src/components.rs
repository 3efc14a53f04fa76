//! Concrete game components.
//!
//! Every component is a strongly-typed serde value with a fixed
//! [`ComponentKind`] tag. Components are attached and detached independently;
//! an entity's "kind" is structural — defined by the set of attached
//! components, never by an inherent type.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::kind::ComponentKind;

/// The contract all component types satisfy.
///
/// `KIND` is the tag recorded in the owning entity's
/// [`KindMask`](crate::KindMask) while a value of this type is attached.
pub trait Component: Send + Sync + 'static {
    /// The kind tag for this component type.
    const KIND: ComponentKind;
}

/// The server-assigned identity of a connected peer ("p1", "p2", …).
///
/// Assigned at connect time and used to tag that peer's Player and Avatar
/// entities until disconnect. A reconnecting peer receives a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Build a player id from the connection counter, e.g. `PlayerId::from_seq(1)` == "p1".
    #[must_use]
    pub fn from_seq(seq: u64) -> Self {
        Self(format!("p{seq}"))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// World-space position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3);

impl Component for Position {
    const KIND: ComponentKind = ComponentKind::Position;
}

/// Linear velocity in world units per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Component for Velocity {
    const KIND: ComponentKind = ComponentKind::Velocity;
}

/// Look orientation as yaw/pitch, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rotation {
    /// Rotation around the vertical axis.
    pub yaw: f32,
    /// Rotation around the horizontal axis.
    pub pitch: f32,
}

impl Component for Rotation {
    const KIND: ComponentKind = ComponentKind::Rotation;
}

/// Hit points. An avatar with `value <= 0` is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub value: i32,
}

impl Health {
    /// Full health for a freshly spawned avatar.
    pub const SPAWN: Health = Health { value: 100 };

    /// Returns `true` when hit points are depleted.
    #[must_use]
    pub const fn is_dead(self) -> bool {
        self.value <= 0
    }
}

impl Component for Health {
    const KIND: ComponentKind = ComponentKind::Health;
}

/// Weapon types an avatar can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weapon {
    Rifle,
    Shotgun,
    Grenade,
}

impl Weapon {
    /// Number of weapon types.
    pub const COUNT: usize = 3;

    /// Index into per-weapon tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Weapon::Rifle => 0,
            Weapon::Shotgun => 1,
            Weapon::Grenade => 2,
        }
    }
}

/// Firing state of a shooter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShooterState {
    #[default]
    Idle,
    Firing,
    Reloading,
}

/// Weapon state and per-weapon ammo for an avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shooter {
    /// Current firing state.
    pub state: ShooterState,
    /// Remaining rounds, indexed by [`Weapon::index`].
    pub ammo: [u32; Weapon::COUNT],
}

impl Shooter {
    /// Ammo remaining for a weapon.
    #[must_use]
    pub fn ammo_for(&self, weapon: Weapon) -> u32 {
        self.ammo[weapon.index()]
    }

    /// Spend one round of the given weapon. Returns `false` when empty.
    pub fn spend(&mut self, weapon: Weapon) -> bool {
        let slot = &mut self.ammo[weapon.index()];
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

impl Default for Shooter {
    fn default() -> Self {
        // Spawn loadout: rifle-heavy, a few shells and grenades.
        Self {
            state: ShooterState::Idle,
            ammo: [120, 24, 3],
        }
    }
}

impl Component for Shooter {
    const KIND: ComponentKind = ComponentKind::Shooter;
}

/// Marks an entity as a player record for a connected peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// The owning peer.
    pub player_id: PlayerId,
}

impl Component for Player {
    const KIND: ComponentKind = ComponentKind::Player;
}

/// Marks an entity as a player's in-world avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    /// The controlling peer.
    pub player_id: PlayerId,
}

impl Component for Avatar {
    const KIND: ComponentKind = ComponentKind::Avatar;
}
