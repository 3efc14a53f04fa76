//! Entity registry — identity lifecycle and per-entity kind masks.
//!
//! The registry is the single source of truth for which entities are alive
//! and which component kinds each one carries. It allocates monotonically
//! increasing ids, so id order equals creation order. Entities are destroyed
//! only through an explicit remove, never implicitly.

use std::collections::HashMap;

use vox_component::{ComponentKind, Entity, KindMask};

use crate::error::WorldError;

/// Owns entity identity and the per-entity attached-kind masks.
#[derive(Debug, Default)]
pub struct EntityRegistry {
    next_id: u64,
    live: HashMap<Entity, KindMask>,
}

impl EntityRegistry {
    /// Create an empty registry. Ids start at 1 (0 is the invalid sentinel).
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: HashMap::new(),
        }
    }

    /// Allocate a fresh entity with an empty kind mask.
    pub fn create(&mut self) -> Entity {
        let entity = Entity::from_raw(self.next_id);
        self.next_id += 1;
        self.live.insert(entity, KindMask::EMPTY);
        entity
    }

    /// Register a caller-supplied id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] if the id collides with a live
    /// entity; the registry is left unchanged.
    pub fn create_with(&mut self, entity: Entity) -> Result<Entity, WorldError> {
        if !entity.is_valid() || self.live.contains_key(&entity) {
            return Err(WorldError::DuplicateId(entity));
        }
        self.live.insert(entity, KindMask::EMPTY);
        // Keep allocation monotonic past explicit ids.
        self.next_id = self.next_id.max(entity.id() + 1);
        Ok(entity)
    }

    /// Remove an entity. Returns `false` if the id was unknown.
    pub fn destroy(&mut self, entity: Entity) -> bool {
        self.live.remove(&entity).is_some()
    }

    /// Returns `true` if the entity is alive.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.live.contains_key(&entity)
    }

    /// The entity's current attached-kind mask.
    #[must_use]
    pub fn mask(&self, entity: Entity) -> Option<KindMask> {
        self.live.get(&entity).copied()
    }

    /// Record a component kind as attached.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotFound`] if the entity is not alive.
    pub fn mark_attached(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
    ) -> Result<KindMask, WorldError> {
        let mask = self
            .live
            .get_mut(&entity)
            .ok_or(WorldError::NotFound(entity))?;
        mask.insert(kind);
        Ok(*mask)
    }

    /// Record a component kind as detached.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotFound`] if the entity is not alive.
    pub fn mark_detached(
        &mut self,
        entity: Entity,
        kind: ComponentKind,
    ) -> Result<KindMask, WorldError> {
        let mask = self
            .live
            .get_mut(&entity)
            .ok_or(WorldError::NotFound(entity))?;
        mask.remove(kind);
        Ok(*mask)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Returns `true` if no entities are alive.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Iterate live entities and their masks, in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, KindMask)> + '_ {
        self.live.iter().map(|(&e, &m)| (e, m))
    }
}
