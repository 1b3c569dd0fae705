#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure geometry shared by every motion source.
//!
//! [`curve::evaluate`] maps a progress value to a position and
//! [`formation::offset`] maps a member index to its formation offset. Neither
//! function holds state, so both can be called from any system.

use skyraid_core::Vec2;

pub mod curve;
pub mod formation;

/// Moves `current` towards `target` by at most `max_step`, never overshooting.
#[must_use]
pub fn move_towards(current: Vec2, target: Vec2, max_step: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_step || distance <= f32::EPSILON {
        return target;
    }
    current + delta / distance * max_step
}

#[cfg(test)]
mod tests {
    use super::move_towards;
    use skyraid_core::Vec2;

    #[test]
    fn move_towards_clamps_to_target() {
        let target = Vec2::new(3.0, 4.0);
        assert_eq!(move_towards(Vec2::ZERO, target, 10.0), target);
        let step = move_towards(Vec2::ZERO, target, 2.5);
        assert!((step - Vec2::new(1.5, 2.0)).length() < 1e-5);
    }

    #[test]
    fn move_towards_is_stationary_at_target() {
        let target = Vec2::new(1.0, 1.0);
        assert_eq!(move_towards(target, target, 0.0), target);
    }
}
