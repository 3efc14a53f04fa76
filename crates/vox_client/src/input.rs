//! Per-tick input snapshot.
//!
//! A frozen structure of movement axes, look deltas, and button edges,
//! sampled once before each frame tick and cleared after. The controller
//! reads this structure only — never raw device state.

use glam::Vec2;

use vox_component::Weapon;

/// Input sampled for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    /// Movement axes: x = strafe (right positive), y = forward.
    pub move_axis: Vec2,
    /// Look delta since last frame: x = yaw, y = pitch, radians.
    pub look_delta: Vec2,
    /// Jump was pressed this frame.
    pub jump: bool,
    /// Weapon fired this frame, if any.
    pub fire: Option<Weapon>,
}

impl InputSnapshot {
    /// Returns `true` when nothing happened this frame.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    /// Reset after the tick has consumed the snapshot.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_resets_everything() {
        let mut input = InputSnapshot {
            move_axis: Vec2::new(1.0, -1.0),
            look_delta: Vec2::new(0.1, 0.0),
            jump: true,
            fire: Some(Weapon::Rifle),
        };
        assert!(!input.is_idle());
        input.clear();
        assert!(input.is_idle());
    }
}
