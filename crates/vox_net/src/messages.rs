//! Action types and the wire envelope.
//!
//! An [`Action`] is an immutable record of one state transition. Actions are
//! the only legal way to mutate canonical world state — on the server they
//! are dispatched into the authoritative [`World`](../../vox_world) and
//! fanned out to peers; on the client every received action is applied
//! verbatim.
//!
//! Field and tag names are camelCase on the wire, matching what the browser
//! client sends and expects.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use vox_component::{Entity, PlayerId, Weapon};

/// One state transition, tagged by `kind` on the wire.
///
/// Matching over `Action` is exhaustive, so adding a variant is a compile
/// error everywhere it must be handled. Discriminants that a *newer* peer
/// sends and this version does not know never reach this type — they are
/// rejected at decode time as
/// [`NetError::UnknownAction`](crate::NetError::UnknownAction) and ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Action {
    /// A peer joined; creates its Player record.
    PlayerJoin {
        /// The joining peer.
        player_id: PlayerId,
    },
    /// A peer left; removes its Player record.
    PlayerLeft {
        /// The departing peer.
        player_id: PlayerId,
    },
    /// Spawn an avatar for a player at a position.
    AvatarSpawn {
        /// The controlling peer.
        player_id: PlayerId,
        /// Spawn position.
        position: Vec3,
    },
    /// Remove an avatar, addressed by its entity id.
    AvatarDespawn {
        /// The avatar entity.
        entity: Entity,
    },
    /// Remove a player's avatar, addressed by the controlling peer.
    AvatarDeath {
        /// The controlling peer.
        player_id: PlayerId,
    },
    /// Position/orientation update for a player's avatar.
    AvatarMove {
        /// The controlling peer.
        player_id: PlayerId,
        /// New world-space position.
        position: Vec3,
        /// New yaw, radians.
        yaw: f32,
        /// New pitch, radians.
        pitch: f32,
    },
    /// A player fired a weapon; spends one round.
    AvatarShoot {
        /// The firing peer.
        player_id: PlayerId,
        /// The weapon fired.
        weapon: Weapon,
    },
}

/// Every `kind` tag this version of the protocol understands. Kept next to
/// the enum so a new variant and its tag land in the same diff.
const KNOWN_ACTION_KINDS: [&str; 7] = [
    "playerJoin",
    "playerLeft",
    "avatarSpawn",
    "avatarDespawn",
    "avatarDeath",
    "avatarMove",
    "avatarShoot",
];

impl Action {
    /// Returns `true` if `kind` names an action this version understands.
    ///
    /// Distinguishes a newer peer's action (safe to ignore) from a malformed
    /// payload of a known kind (a protocol bug worth surfacing).
    #[must_use]
    pub fn is_known_kind(kind: &str) -> bool {
        KNOWN_ACTION_KINDS.contains(&kind)
    }

    /// The peer a targeted action refers to, when it has one.
    #[must_use]
    pub fn player_id(&self) -> Option<&PlayerId> {
        match self {
            Action::PlayerJoin { player_id }
            | Action::PlayerLeft { player_id }
            | Action::AvatarSpawn { player_id, .. }
            | Action::AvatarDeath { player_id }
            | Action::AvatarMove { player_id, .. }
            | Action::AvatarShoot { player_id, .. } => Some(player_id),
            Action::AvatarDespawn { .. } => None,
        }
    }
}

/// The wire message exchanged over a peer connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "camelCase")]
pub enum Envelope {
    /// First frame on every connection: tells the peer the id the server
    /// assigned to it. Nothing else refers to the peer until this arrives.
    #[serde(rename_all = "camelCase")]
    Welcome {
        /// The connection's assigned id.
        player_id: PlayerId,
    },
    /// Carry one action to be applied via `World::dispatch`.
    Dispatch {
        /// The action payload.
        action: Action,
    },
}

impl Envelope {
    /// Wrap an action for the wire.
    #[must_use]
    pub fn dispatch(action: Action) -> Self {
        Envelope::Dispatch { action }
    }

    /// The connection greeting carrying the assigned id.
    #[must_use]
    pub fn welcome(player_id: PlayerId) -> Self {
        Envelope::Welcome { player_id }
    }
}
