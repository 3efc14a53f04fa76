//! # vox_world
//!
//! The authoritative world core: entity lifecycle, family (archetype)
//! membership, action dispatch, and the fixed-or-variable tick scheduler.
//!
//! Exactly one [`World`] exists per process — server or client. All
//! canonical mutation flows through [`World::dispatch`]; the network layer
//! never writes fields directly. Both the server (fixed 60 Hz timer) and the
//! client (once per rendered frame with a measured `dt`) drive the same
//! [`Scheduler`].

pub mod error;
pub mod family;
pub mod registry;
pub mod scene;
pub mod schedule;
pub mod systems;
pub mod world;

pub use error::WorldError;
pub use family::{FamilyId, FamilyIndex};
pub use registry::EntityRegistry;
pub use scene::{NullScene, SceneHandle};
pub use schedule::{Scheduler, System};
pub use systems::{MovementSystem, RegenSystem};
pub use world::World;
