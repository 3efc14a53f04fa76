//! # vox_component
//!
//! The data layer of the voxel-shooter world core — defines what an entity
//! is, which component kinds exist, and how component values are stored.
//!
//! This crate provides:
//!
//! - [`Entity`] — lightweight `u64` entity identifiers.
//! - [`ComponentKind`] / [`KindMask`] — the closed set of component kinds and
//!   the per-entity capability bitset used for family matching.
//! - [`Component`] trait and the concrete game components
//!   ([`Position`], [`Velocity`], [`Rotation`], [`Health`], [`Shooter`],
//!   [`Player`], [`Avatar`]).
//! - [`ComponentStore`] — sparse, typed per-entity attribute storage.

pub mod components;
pub mod entity;
pub mod kind;
pub mod store;

pub use components::{
    Avatar, Component, Health, Player, PlayerId, Position, Rotation, Shooter, ShooterState,
    Velocity, Weapon,
};
pub use entity::Entity;
pub use kind::{ComponentKind, KindMask};
pub use store::{ComponentStore, Stored};
