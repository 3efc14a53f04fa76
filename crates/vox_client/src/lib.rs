//! # vox_client
//!
//! Client-side world session. The client owns its own [`World`]
//! (vox_world::World) and applies every action received from the server
//! verbatim via dispatch — no independent validation, no rollback. The
//! server's welcome frame tells the session which player it controls; local
//! input then drives the controller for prediction, and the resulting
//! movement is sent back to the server as `AvatarMove` actions.

pub mod input;
pub mod session;

pub use input::InputSnapshot;
pub use session::ClientSession;
