//! # vox_net
//!
//! Wire layer for the voxel-shooter world core.
//!
//! This crate provides:
//!
//! - [`Action`] — the discriminated union of state transitions; the single
//!   channel through which canonical state may change.
//! - [`Envelope`] — the tagged wire message: the `welcome` greeting carrying
//!   the assigned connection id, and `dispatch` carrying one action.
//! - [`codec`] — JSON encode/decode helpers, including the two-stage decode
//!   that distinguishes unknown action tags from transport garbage.
//! - [`framing`] — length-prefixed frames over async byte streams.
//! - [`NetError`] — network-layer error taxonomy.

pub mod codec;
pub mod error;
pub mod framing;
pub mod messages;

pub use codec::{decode_envelope, encode, encode_action, encode_welcome};
pub use error::NetError;
pub use framing::{read_frame, write_frame, MAX_FRAME_BYTES};
pub use messages::{Action, Envelope};
