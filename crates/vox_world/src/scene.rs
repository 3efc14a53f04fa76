//! Scene handle — the rendering collaborator seam.
//!
//! The core treats the scene purely as a side-effecting sink: action handlers
//! attach a renderable when an avatar spawns and detach it when the avatar
//! despawns. Renderable state is a side table keyed by entity id inside the
//! handle implementation, never a back-reference stored on the entity.

use glam::Vec3;

use vox_component::Entity;

/// Sink for renderable attach/detach side effects.
pub trait SceneHandle: Send {
    /// An avatar spawned at `position`; attach its representation.
    fn attach(&mut self, entity: Entity, position: Vec3);

    /// An avatar despawned; detach its representation.
    fn detach(&mut self, entity: Entity);
}

/// No-op scene for headless use (the authoritative server renders nothing).
#[derive(Debug, Default)]
pub struct NullScene;

impl SceneHandle for NullScene {
    fn attach(&mut self, _entity: Entity, _position: Vec3) {}
    fn detach(&mut self, _entity: Entity) {}
}
