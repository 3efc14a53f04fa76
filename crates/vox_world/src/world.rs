//! The world — canonical entity state and action dispatch.
//!
//! The [`World`] owns the entity registry, the component store, the family
//! index, and the scene-handle sink. Canonical state changes only through
//! [`World::dispatch`]; the store and registry are private, so the network
//! layer cannot write fields directly. A dispatch applies exactly one state
//! transition synchronously — family membership is refreshed after each
//! individual attach/detach, so no observer ever sees a partially-applied
//! action.

use std::time::Duration;

use glam::Vec3;
use tracing::{debug, warn};

use vox_component::{
    Avatar, ComponentKind, ComponentStore, Entity, Health, KindMask, Player, PlayerId, Position,
    Rotation, Shooter, ShooterState, Stored, Velocity,
};
use vox_net::Action;

use crate::error::WorldError;
use crate::family::{FamilyId, FamilyIndex};
use crate::registry::EntityRegistry;
use crate::scene::{NullScene, SceneHandle};

/// The root owner of registry, store, families, and the scene sink.
pub struct World {
    registry: EntityRegistry,
    store: ComponentStore,
    families: FamilyIndex,
    scene: Box<dyn SceneHandle>,
    /// Family of player records: {Player}.
    players: FamilyId,
    /// Family of in-world avatars: {Avatar, Position}.
    avatars: FamilyId,
    /// Total simulated time, advanced by the scheduler.
    elapsed: Duration,
}

impl World {
    /// Create a world with the given scene sink.
    #[must_use]
    pub fn new(scene: Box<dyn SceneHandle>) -> Self {
        let mut families = FamilyIndex::new();
        let players = families.register(KindMask::of(&[ComponentKind::Player]));
        let avatars =
            families.register(KindMask::of(&[ComponentKind::Avatar, ComponentKind::Position]));
        Self {
            registry: EntityRegistry::new(),
            store: ComponentStore::new(),
            families,
            scene,
            players,
            avatars,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a headless world (no rendering side effects).
    #[must_use]
    pub fn headless() -> Self {
        Self::new(Box::new(NullScene))
    }

    // ── Entity lifecycle ────────────────────────────────────────────────

    /// Allocate a fresh entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        self.registry.create()
    }

    /// Register a caller-supplied entity id.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::DuplicateId`] on collision with a live entity.
    pub fn create_entity_with(&mut self, entity: Entity) -> Result<Entity, WorldError> {
        self.registry.create_with(entity)
    }

    /// Destroy an entity and all its components.
    ///
    /// Families are notified before the data is dropped; the entity is
    /// force-removed from every family regardless of its component state.
    /// Returns `false` if the id was unknown (consistent no-op policy).
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.registry.contains(entity) {
            return false;
        }
        self.families.purge(entity);
        self.store.clear_entity(entity);
        self.registry.destroy(entity)
    }

    /// Attach (or replace) a component on a live entity, then re-evaluate
    /// family membership for it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotFound`] if the entity is not alive.
    pub fn attach<T: Stored>(&mut self, entity: Entity, value: T) -> Result<(), WorldError> {
        let mask = self.registry.mark_attached(entity, T::KIND)?;
        self.store.insert(entity, value);
        self.families.refresh(entity, mask);
        Ok(())
    }

    /// Detach a component from a live entity, then re-evaluate family
    /// membership for it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NotFound`] if the entity is not alive.
    pub fn detach<T: Stored>(&mut self, entity: Entity) -> Result<Option<T>, WorldError> {
        let mask = self.registry.mark_detached(entity, T::KIND)?;
        let value = self.store.remove::<T>(entity);
        self.families.refresh(entity, mask);
        Ok(value)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Read a component value.
    #[must_use]
    pub fn get<T: Stored>(&self, entity: Entity) -> Option<&T> {
        self.store.get(entity)
    }

    /// Mutate a component in place. Reserved for systems running inside the
    /// tick; external collaborators go through [`World::dispatch`].
    pub fn get_mut<T: Stored>(&mut self, entity: Entity) -> Option<&mut T> {
        self.store.get_mut(entity)
    }

    /// Returns `true` if the entity is alive.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.registry.contains(entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Live avatar entities, in creation order.
    pub fn avatars(&self) -> impl Iterator<Item = Entity> + '_ {
        self.families.members(self.avatars).iter().copied()
    }

    /// Live player-record entities, in creation order.
    pub fn players(&self) -> impl Iterator<Item = Entity> + '_ {
        self.families.members(self.players).iter().copied()
    }

    /// The first player record tagged with `player_id`, in id order.
    #[must_use]
    pub fn player_entity(&self, player_id: &PlayerId) -> Option<Entity> {
        self.players()
            .find(|&e| self.get::<Player>(e).is_some_and(|p| &p.player_id == player_id))
    }

    /// The first avatar tagged with `player_id`, in id order.
    #[must_use]
    pub fn avatar_entity(&self, player_id: &PlayerId) -> Option<Entity> {
        self.avatars()
            .find(|&e| self.get::<Avatar>(e).is_some_and(|a| &a.player_id == player_id))
    }

    // ── Families ────────────────────────────────────────────────────────

    /// Declare an additional archetype; systems use the returned handle.
    pub fn register_family(&mut self, required: KindMask) -> FamilyId {
        self.families.register(required)
    }

    /// Live members of a family, in creation order.
    pub fn family_members(&self, id: FamilyId) -> impl Iterator<Item = Entity> + '_ {
        self.families.members(id).iter().copied()
    }

    /// Register an added-callback on a family.
    pub fn on_family_added(&mut self, id: FamilyId, cb: impl FnMut(Entity) + Send + 'static) {
        self.families.on_added(id, cb);
    }

    /// Register a removed-callback on a family.
    pub fn on_family_removed(&mut self, id: FamilyId, cb: impl FnMut(Entity) + Send + 'static) {
        self.families.on_removed(id, cb);
    }

    // ── Time ────────────────────────────────────────────────────────────

    /// Total simulated time.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Advance simulated time. Called by the scheduler once per tick.
    pub fn advance(&mut self, dt: Duration) {
        self.elapsed += dt;
    }

    // ── Dispatch ────────────────────────────────────────────────────────

    /// Apply exactly one state transition.
    ///
    /// Runs to completion before returning; the match is exhaustive over
    /// [`Action`], so a new action kind fails to compile until every handler
    /// site is updated.
    ///
    /// # Errors
    ///
    /// Per-action failures ([`WorldError::NotFound`],
    /// [`WorldError::PlayerNotFound`], [`WorldError::AlreadyJoined`]) leave
    /// the world unchanged. Callers at the scheduler/replication boundary
    /// downgrade them to a logged no-op — one bad action never halts the
    /// tick loop.
    pub fn dispatch(&mut self, action: &Action) -> Result<(), WorldError> {
        match action {
            Action::PlayerJoin { player_id } => self.apply_player_join(player_id),
            Action::PlayerLeft { player_id } => self.apply_player_left(player_id),
            Action::AvatarSpawn {
                player_id,
                position,
            } => self.apply_avatar_spawn(player_id, *position),
            Action::AvatarDespawn { entity } => self.apply_avatar_despawn(*entity),
            Action::AvatarDeath { player_id } => self.apply_avatar_death(player_id),
            Action::AvatarMove {
                player_id,
                position,
                yaw,
                pitch,
            } => self.apply_avatar_move(player_id, *position, *yaw, *pitch),
            Action::AvatarShoot { player_id, weapon } => {
                self.apply_avatar_shoot(player_id, *weapon)
            }
        }
    }

    fn apply_player_join(&mut self, player_id: &PlayerId) -> Result<(), WorldError> {
        // Joins are idempotent by player id: a re-delivered join must not
        // create a second player record.
        if self.player_entity(player_id).is_some() {
            warn!(%player_id, "duplicate join ignored");
            return Err(WorldError::AlreadyJoined(player_id.clone()));
        }
        let entity = self.registry.create();
        self.attach(
            entity,
            Player {
                player_id: player_id.clone(),
            },
        )?;
        debug!(%player_id, %entity, "player joined");
        Ok(())
    }

    fn apply_player_left(&mut self, player_id: &PlayerId) -> Result<(), WorldError> {
        let entity = self
            .player_entity(player_id)
            .ok_or_else(|| WorldError::PlayerNotFound(player_id.clone()))?;
        self.destroy_entity(entity);
        debug!(%player_id, %entity, "player left");
        Ok(())
    }

    fn apply_avatar_spawn(
        &mut self,
        player_id: &PlayerId,
        position: Vec3,
    ) -> Result<(), WorldError> {
        let entity = self.registry.create();
        self.attach(
            entity,
            Avatar {
                player_id: player_id.clone(),
            },
        )?;
        self.attach(entity, Position(position))?;
        self.attach(entity, Velocity::default())?;
        self.attach(entity, Rotation::default())?;
        self.attach(entity, Health::SPAWN)?;
        self.attach(entity, Shooter::default())?;
        self.scene.attach(entity, position);
        debug!(%player_id, %entity, ?position, "avatar spawned");
        Ok(())
    }

    fn apply_avatar_despawn(&mut self, entity: Entity) -> Result<(), WorldError> {
        if !self.registry.contains(entity) {
            return Err(WorldError::NotFound(entity));
        }
        self.scene.detach(entity);
        self.destroy_entity(entity);
        debug!(%entity, "avatar despawned");
        Ok(())
    }

    fn apply_avatar_death(&mut self, player_id: &PlayerId) -> Result<(), WorldError> {
        let entity = self
            .avatar_entity(player_id)
            .ok_or_else(|| WorldError::PlayerNotFound(player_id.clone()))?;
        self.scene.detach(entity);
        self.destroy_entity(entity);
        debug!(%player_id, %entity, "avatar died");
        Ok(())
    }

    fn apply_avatar_move(
        &mut self,
        player_id: &PlayerId,
        position: Vec3,
        yaw: f32,
        pitch: f32,
    ) -> Result<(), WorldError> {
        let entity = self
            .avatar_entity(player_id)
            .ok_or_else(|| WorldError::PlayerNotFound(player_id.clone()))?;
        if let Some(pos) = self.get_mut::<Position>(entity) {
            pos.0 = position;
        }
        if let Some(rot) = self.get_mut::<Rotation>(entity) {
            rot.yaw = yaw;
            rot.pitch = pitch;
        }
        Ok(())
    }

    fn apply_avatar_shoot(
        &mut self,
        player_id: &PlayerId,
        weapon: vox_component::Weapon,
    ) -> Result<(), WorldError> {
        let entity = self
            .avatar_entity(player_id)
            .ok_or_else(|| WorldError::PlayerNotFound(player_id.clone()))?;
        if let Some(shooter) = self.get_mut::<Shooter>(entity) {
            if shooter.spend(weapon) {
                shooter.state = ShooterState::Firing;
            } else {
                // Dry fire: nothing spent, flag a reload.
                shooter.state = ShooterState::Reloading;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.registry.len())
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}
