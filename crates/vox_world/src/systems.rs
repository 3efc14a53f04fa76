//! Built-in systems.
//!
//! [`MovementSystem`] integrates continuously; [`RegenSystem`] is a
//! throttled system and doubles as the reference user of the scheduler's
//! sub-tick-rate path.

use std::time::Duration;

use vox_component::{Health, Position, Velocity};

use crate::schedule::System;
use crate::world::World;

/// Integrates avatar velocity into position every tick.
#[derive(Debug, Default)]
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn update(&mut self, world: &mut World, dt: Duration) {
        let avatars: Vec<_> = world.avatars().collect();
        for entity in avatars {
            let Some(vel) = world.get::<Velocity>(entity).copied() else {
                continue;
            };
            if let Some(pos) = world.get_mut::<Position>(entity) {
                pos.0 += vel.0 * dt.as_secs_f32();
            }
        }
    }
}

/// Slowly regenerates avatar health, up to the spawn cap.
///
/// Intended to be registered with
/// [`Scheduler::add_throttled`](crate::Scheduler::add_throttled), e.g. once
/// per second.
#[derive(Debug)]
pub struct RegenSystem {
    /// Hit points restored per invocation.
    pub amount: i32,
}

impl Default for RegenSystem {
    fn default() -> Self {
        Self { amount: 1 }
    }
}

impl System for RegenSystem {
    fn name(&self) -> &str {
        "regen"
    }

    fn update(&mut self, world: &mut World, _dt: Duration) {
        let avatars: Vec<_> = world.avatars().collect();
        for entity in avatars {
            if let Some(health) = world.get_mut::<Health>(entity)
                && !health.is_dead()
                && health.value < Health::SPAWN.value
            {
                health.value = (health.value + self.amount).min(Health::SPAWN.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use vox_component::PlayerId;
    use vox_net::Action;

    use super::*;
    use crate::schedule::Scheduler;

    fn spawn(world: &mut World, id: &str, position: Vec3) {
        world
            .dispatch(&Action::AvatarSpawn {
                player_id: PlayerId::from(id),
                position,
            })
            .unwrap();
    }

    #[test]
    fn test_movement_integrates_velocity() {
        let mut world = World::headless();
        spawn(&mut world, "p1", Vec3::ZERO);
        let e = world.avatar_entity(&PlayerId::from("p1")).unwrap();
        world.get_mut::<Velocity>(e).unwrap().0 = Vec3::new(2.0, 0.0, 0.0);

        let mut scheduler = Scheduler::new();
        scheduler.add_system(MovementSystem);
        scheduler.tick(&mut world, Duration::from_millis(500));

        assert_eq!(world.get::<Position>(e).unwrap().0, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_regen_caps_at_spawn_health() {
        let mut world = World::headless();
        spawn(&mut world, "p1", Vec3::ZERO);
        let e = world.avatar_entity(&PlayerId::from("p1")).unwrap();
        world.get_mut::<Health>(e).unwrap().value = 99;

        let mut system = RegenSystem { amount: 5 };
        system.update(&mut world, Duration::from_secs(1));
        assert_eq!(world.get::<Health>(e).unwrap().value, Health::SPAWN.value);
    }

    #[test]
    fn test_regen_skips_the_dead() {
        let mut world = World::headless();
        spawn(&mut world, "p1", Vec3::ZERO);
        let e = world.avatar_entity(&PlayerId::from("p1")).unwrap();
        world.get_mut::<Health>(e).unwrap().value = 0;

        let mut system = RegenSystem { amount: 5 };
        system.update(&mut world, Duration::from_secs(1));
        assert_eq!(world.get::<Health>(e).unwrap().value, 0);
    }
}
