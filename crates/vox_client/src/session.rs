//! Client session — apply the server stream, tick the local world.
//!
//! Every received action is applied through `World::dispatch` unmodified;
//! the client trusts the server's action stream completely. The scheduler is
//! driven once per rendered frame with a measured `dt`. The controller maps
//! the frame's input snapshot onto the local avatar and queues the resulting
//! `AvatarMove` / `AvatarShoot` actions for sending back to the server.

use std::time::Duration;

use glam::Vec2;
use tracing::{debug, warn};

use vox_component::{PlayerId, Position, Rotation, Velocity};
use vox_net::{codec, Action, Envelope};
use vox_world::{MovementSystem, SceneHandle, Scheduler, World};

/// Ground speed of a controlled avatar, world units per second.
const MOVE_SPEED: f32 = 6.0;
/// Vertical velocity applied on a jump edge.
const JUMP_SPEED: f32 = 4.5;

/// One client's world, scheduler, and local-player state.
pub struct ClientSession {
    world: World,
    scheduler: Scheduler,
    local_player: Option<PlayerId>,
    outgoing: Vec<Action>,
}

impl ClientSession {
    /// Create a session rendering into the given scene.
    #[must_use]
    pub fn new(scene: Box<dyn SceneHandle>) -> Self {
        let mut scheduler = Scheduler::new();
        scheduler.add_system(MovementSystem);
        Self {
            world: World::new(scene),
            scheduler,
            local_player: None,
            outgoing: Vec::new(),
        }
    }

    /// Create a session with no rendering side effects.
    #[must_use]
    pub fn headless() -> Self {
        Self::new(Box::new(vox_world::NullScene))
    }

    /// Record which player this client controls (the id the server assigned
    /// to our connection).
    pub fn set_local_player(&mut self, player_id: PlayerId) {
        debug!(%player_id, "local player set");
        self.local_player = Some(player_id);
    }

    /// The controlled player, once known.
    #[must_use]
    pub fn local_player(&self) -> Option<&PlayerId> {
        self.local_player.as_ref()
    }

    /// The client-side world (reads for rendering and HUD).
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Apply one wire frame received from the server.
    ///
    /// A welcome frame records the id the server assigned to this
    /// connection. Unknown action kinds and per-action dispatch failures are
    /// downgraded to diagnostics — a bad frame never breaks the session.
    pub fn apply_frame(&mut self, bytes: &[u8]) {
        match codec::decode_envelope(bytes) {
            Ok(Envelope::Welcome { player_id }) => {
                self.set_local_player(player_id);
            }
            Ok(Envelope::Dispatch { action }) => {
                if let Err(err) = self.world.dispatch(&action) {
                    warn!(%err, ?action, "server action rejected locally");
                }
            }
            Err(err) if err.is_ignorable() => {
                warn!(%err, "ignoring unknown server action");
            }
            Err(err) => {
                warn!(%err, "dropping undecodable server frame");
            }
        }
    }

    /// Run one rendered frame: apply input to the local avatar, tick the
    /// scheduler with the measured `dt`, queue outgoing updates.
    pub fn frame(&mut self, dt: Duration, input: &crate::input::InputSnapshot) {
        self.apply_input(input);
        self.scheduler.tick(&mut self.world, dt);
        self.queue_updates(input);
    }

    /// Actions produced this frame, to be sent to the server.
    pub fn drain_outgoing(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.outgoing)
    }

    fn local_avatar(&self) -> Option<vox_component::Entity> {
        let player_id = self.local_player.as_ref()?;
        self.world.avatar_entity(player_id)
    }

    fn apply_input(&mut self, input: &crate::input::InputSnapshot) {
        let Some(entity) = self.local_avatar() else {
            return;
        };

        let yaw = {
            let Some(rot) = self.world.get_mut::<Rotation>(entity) else {
                return;
            };
            rot.yaw -= input.look_delta.x;
            rot.pitch = (rot.pitch - input.look_delta.y)
                .clamp(-std::f32::consts::FRAC_PI_2, std::f32::consts::FRAC_PI_2);
            rot.yaw
        };

        if let Some(vel) = self.world.get_mut::<Velocity>(entity) {
            let forward = Vec2::new(-yaw.sin(), -yaw.cos());
            let right = Vec2::new(forward.y, -forward.x);
            let planar = (forward * input.move_axis.y + right * input.move_axis.x) * MOVE_SPEED;
            vel.0.x = planar.x;
            vel.0.z = planar.y;
            if input.jump {
                vel.0.y = JUMP_SPEED;
            }
        }
    }

    fn queue_updates(&mut self, input: &crate::input::InputSnapshot) {
        let Some(player_id) = self.local_player.clone() else {
            return;
        };
        let Some(entity) = self.local_avatar() else {
            return;
        };

        let moving =
            input.move_axis != Vec2::ZERO || input.look_delta != Vec2::ZERO || input.jump;
        if moving
            && let (Some(pos), Some(rot)) = (
                self.world.get::<Position>(entity),
                self.world.get::<Rotation>(entity),
            )
        {
            self.outgoing.push(Action::AvatarMove {
                player_id: player_id.clone(),
                position: pos.0,
                yaw: rot.yaw,
                pitch: rot.pitch,
            });
        }
        if let Some(weapon) = input.fire {
            self.outgoing.push(Action::AvatarShoot { player_id, weapon });
        }
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("local_player", &self.local_player)
            .field("entities", &self.world.entity_count())
            .finish_non_exhaustive()
    }
}
