//! Sparse, typed per-entity component storage.
//!
//! The store keeps one typed column per component kind, keyed by [`Entity`].
//! Ownership is exclusive: one value per (entity, kind), and a value belongs
//! to exactly one entity. The store knows nothing about entity liveness or
//! family membership — the registry and family index in `vox_world` own
//! those concerns and drive the store through the dispatch path.

use std::collections::HashMap;

use crate::components::{
    Avatar, Component, Health, Player, Position, Rotation, Shooter, Velocity,
};
use crate::entity::Entity;

/// A component type that has a column in the [`ComponentStore`].
///
/// Implemented for every concrete component; generic store access goes
/// through the column accessors so callers write `store.get::<Health>(e)`.
pub trait Stored: Component + Sized {
    /// The column holding values of this type.
    fn column(store: &ComponentStore) -> &HashMap<Entity, Self>;
    /// Mutable access to the column.
    fn column_mut(store: &mut ComponentStore) -> &mut HashMap<Entity, Self>;
}

macro_rules! columns {
    ($($field:ident: $ty:ty),* $(,)?) => {
        /// Sparse component storage: one typed column per component kind.
        #[derive(Debug, Default)]
        pub struct ComponentStore {
            $($field: HashMap<Entity, $ty>,)*
        }

        $(impl Stored for $ty {
            fn column(store: &ComponentStore) -> &HashMap<Entity, Self> {
                &store.$field
            }
            fn column_mut(store: &mut ComponentStore) -> &mut HashMap<Entity, Self> {
                &mut store.$field
            }
        })*

        impl ComponentStore {
            /// Drop every component attached to `entity`, across all columns.
            ///
            /// Called by the registry when an entity is destroyed.
            pub fn clear_entity(&mut self, entity: Entity) {
                $(self.$field.remove(&entity);)*
            }
        }
    };
}

columns! {
    positions: Position,
    velocities: Velocity,
    rotations: Rotation,
    healths: Health,
    shooters: Shooter,
    players: Player,
    avatars: Avatar,
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or replace) a component value on an entity.
    ///
    /// Returns the previous value when the entity already had one.
    pub fn insert<T: Stored>(&mut self, entity: Entity, value: T) -> Option<T> {
        T::column_mut(self).insert(entity, value)
    }

    /// Detach a component from an entity, returning it if present.
    pub fn remove<T: Stored>(&mut self, entity: Entity) -> Option<T> {
        T::column_mut(self).remove(&entity)
    }

    /// Read a component value.
    #[must_use]
    pub fn get<T: Stored>(&self, entity: Entity) -> Option<&T> {
        T::column(self).get(&entity)
    }

    /// Mutate a component value in place.
    pub fn get_mut<T: Stored>(&mut self, entity: Entity) -> Option<&mut T> {
        T::column_mut(self).get_mut(&entity)
    }

    /// Returns `true` if the entity has a component of this type.
    #[must_use]
    pub fn has<T: Stored>(&self, entity: Entity) -> bool {
        T::column(self).contains_key(&entity)
    }

    /// Iterate a column's (entity, value) pairs in unspecified order.
    pub fn iter<T: Stored>(&self) -> impl Iterator<Item = (Entity, &T)> {
        T::column(self).iter().map(|(&e, v)| (e, v))
    }
}
