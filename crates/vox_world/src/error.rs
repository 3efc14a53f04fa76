//! World-layer error types.

use vox_component::{Entity, PlayerId};

/// Errors from registry operations and action dispatch.
///
/// None of these are fatal to the tick loop: the scheduler/replication
/// boundary downgrades every per-action failure to a logged no-op.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The operation referenced an entity that does not exist.
    #[error("entity {0} not found")]
    NotFound(Entity),

    /// No live entity is tagged with this player id.
    #[error("no entity for player {0}")]
    PlayerNotFound(PlayerId),

    /// Entity creation collided with a live id. The registry is unchanged;
    /// the caller must pick a fresh id.
    #[error("entity id {0} already in use")]
    DuplicateId(Entity),

    /// A player record already exists for this id; duplicate joins are
    /// rejected as idempotent no-ops.
    #[error("player {0} already joined")]
    AlreadyJoined(PlayerId),
}
