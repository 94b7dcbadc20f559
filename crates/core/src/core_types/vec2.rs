//! Vector type alias for 2D screen-space positions and directions.

use nalgebra::Vector2;

/// 2D vector type for positions, velocities, forces, and wind.
///
/// This is a simple alias for `nalgebra::Vector2<f32>`. Screen space uses
/// `+y` pointing down, so "falling" means increasing `y`.
pub type Vec2 = Vector2<f32>;

/// Helpers nalgebra does not provide in the zero-safe form the simulation needs.
pub trait Vec2Ext {
    /// Unit vector in the same direction, or the zero vector for zero input.
    fn normalized_or_zero(&self) -> Vec2;

    /// Copy scaled down so its magnitude does not exceed `max_magnitude`.
    fn clamped(&self, max_magnitude: f32) -> Vec2;
}

impl Vec2Ext for Vec2 {
    #[inline]
    fn normalized_or_zero(&self) -> Vec2 {
        let mag = self.magnitude();
        if mag > 0.0 {
            *self / mag
        } else {
            Vec2::zeros()
        }
    }

    #[inline]
    fn clamped(&self, max_magnitude: f32) -> Vec2 {
        let mag = self.magnitude();
        if mag > max_magnitude {
            self.normalized_or_zero() * max_magnitude
        } else {
            *self
        }
    }
}
