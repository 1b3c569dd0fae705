//! Conversion from normalized screen coordinates to world coordinates.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Maps a normalized screen point onto the world plane at a depth hint.
///
/// Implemented for any `Fn(Vec2, f32) -> Vec2` so tests can pass closures.
pub trait Projector {
    /// Converts a normalized point (`(0,0)` bottom-left, `(1,1)` top-right) to world space.
    fn to_world(&self, normalized: Vec2, depth: f32) -> Vec2;
}

impl<F> Projector for F
where
    F: Fn(Vec2, f32) -> Vec2,
{
    fn to_world(&self, normalized: Vec2, depth: f32) -> Vec2 {
        self(normalized, depth)
    }
}

/// Projects a normalized point, treating it as a world point when no projector is active.
#[must_use]
pub fn project(projector: Option<&dyn Projector>, point: Vec2, depth: f32) -> Vec2 {
    match projector {
        Some(projector) => projector.to_world(point, depth),
        None => point,
    }
}

/// Axis-aligned orthographic view of the gameplay plane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// World position at the middle of the screen.
    pub center: Vec2,
    /// Half of the visible width and height in world units.
    pub half_extents: Vec2,
}

impl Viewport {
    /// Creates a viewport from its center and half extents.
    #[must_use]
    pub const fn new(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// Creates a viewport from an orthographic size (half height) and aspect ratio.
    #[must_use]
    pub fn from_orthographic(center: Vec2, orthographic_size: f32, aspect: f32) -> Self {
        Self::new(
            center,
            Vec2::new(orthographic_size * aspect, orthographic_size),
        )
    }

    /// Half of the visible width.
    #[must_use]
    pub fn half_width(&self) -> f32 {
        self.half_extents.x
    }

    /// World x of the left screen edge.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.center.x - self.half_extents.x
    }

    /// World x of the right screen edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.center.x + self.half_extents.x
    }

    /// World y of the top screen edge.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.center.y + self.half_extents.y
    }

    /// World y of the bottom screen edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.half_extents.y
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_orthographic(Vec2::ZERO, 5.0, 9.0 / 16.0)
    }
}

impl Projector for Viewport {
    fn to_world(&self, normalized: Vec2, _depth: f32) -> Vec2 {
        self.center + (normalized - Vec2::splat(0.5)) * 2.0 * self.half_extents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_maps_corners_to_edges() {
        let viewport = Viewport::from_orthographic(Vec2::new(1.0, 2.0), 5.0, 0.5);
        assert_eq!(viewport.to_world(Vec2::ZERO, 0.0), Vec2::new(-1.5, -3.0));
        assert_eq!(viewport.to_world(Vec2::ONE, 0.0), Vec2::new(3.5, 7.0));
        assert_eq!(viewport.left(), -1.5);
        assert_eq!(viewport.top(), 7.0);
    }

    #[test]
    fn absent_projector_is_identity() {
        let point = Vec2::new(0.25, 0.75);
        assert_eq!(project(None, point, 0.0), point);

        let doubled = |p: Vec2, _depth: f32| p * 2.0;
        assert_eq!(project(Some(&doubled), point, 0.0), Vec2::new(0.5, 1.5));
    }
}
