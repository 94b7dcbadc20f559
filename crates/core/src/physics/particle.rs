//! Point-mass particle state for precipitation and debris.
//!
//! A [`Particle`] is owned exclusively by the [`ParticleSystem`](super::ParticleSystem)
//! that spawned it. Forces are accumulated per step and cleared before each
//! integration, so nothing carries over between sub-steps except position,
//! velocity, and age.

use crate::core_types::vec2::{Vec2, Vec2Ext};
use crate::physics::integration::IntegrationScheme;
use crate::render::ColorId;
use serde::{Deserialize, Serialize};

/// A physics-enabled particle with a force accumulator.
///
/// # Example
///
/// ```
/// use stormscape_core::physics::Particle;
/// use stormscape_core::Vec2;
///
/// let mut drop = Particle::raindrop(10.0, 0.0, 0.4);
/// drop.apply_force(Vec2::new(0.0, 0.25));
/// assert!(drop.is_alive());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Acceleration computed during the last integration step.
    pub acceleration: Vec2,
    /// Position before the last Verlet step.
    pub prev_position: Vec2,

    pub(crate) mass: f32,
    pub(crate) inverse_mass: f32,
    pub radius: f32,

    pub drag_coefficient: f32,
    /// Bounciness in [0, 1]. Carried for adapters that resolve collisions.
    pub restitution: f32,
    pub friction: f32,
    buoyancy_factor: f32,

    pub glyph: char,
    pub color: ColorId,

    /// Number of system updates this particle has lived through.
    pub age: u32,
    /// Lifetime in updates; zero or negative means immortal.
    pub max_age: i32,
    pub(crate) alive: bool,

    #[serde(skip)]
    force_accumulator: Vec2,
    #[serde(skip)]
    verlet_seeded: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self::new(Vec2::zeros(), 1.0)
    }
}

impl Particle {
    /// Create a particle at `position` with the given mass and default material.
    ///
    /// A non-positive mass produces an immovable particle (`inverse_mass == 0`).
    pub fn new(position: Vec2, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec2::zeros(),
            acceleration: Vec2::zeros(),
            prev_position: position,
            mass,
            inverse_mass: if mass > 0.0 { 1.0 / mass } else { 0.0 },
            radius: 0.5,
            drag_coefficient: 0.47,
            restitution: 0.3,
            friction: 0.5,
            buoyancy_factor: 0.0,
            glyph: '·',
            color: ColorId::WHITE,
            age: 0,
            max_age: -1,
            alive: true,
            force_accumulator: Vec2::zeros(),
            verlet_seeded: false,
        }
    }

    /// A particle with infinite mass. Forces never move it.
    pub fn immovable(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    /// Raindrop falling from `(x, y)`, drifting with a fraction of `wind_x`.
    pub fn raindrop(x: f32, y: f32, wind_x: f32) -> Self {
        Self::new(Vec2::new(x, y), 0.5)
            .with_velocity(Vec2::new(wind_x * 0.5, 1.0))
            .with_drag_coefficient(0.3)
            .with_glyph('|')
            .with_max_age(200)
    }

    /// Light snowflake with high drag and strong buoyancy.
    pub fn snowflake(x: f32, y: f32, wind_x: f32) -> Self {
        Self::new(Vec2::new(x, y), 0.1)
            .with_velocity(Vec2::new(wind_x * 0.3, 0.2))
            .with_drag_coefficient(0.8)
            .with_buoyancy(0.4)
            .with_glyph('*')
            .with_max_age(400)
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_drag_coefficient(mut self, drag_coefficient: f32) -> Self {
        self.drag_coefficient = drag_coefficient;
        self
    }

    pub fn with_buoyancy(mut self, factor: f32) -> Self {
        self.set_buoyancy(factor);
        self
    }

    pub fn with_glyph(mut self, glyph: char) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn with_color(mut self, color: ColorId) -> Self {
        self.color = color;
        self
    }

    pub fn with_max_age(mut self, max_age: i32) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn mass(&self) -> f32 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    /// Change the mass and recompute the cached inverse.
    pub fn set_mass(&mut self, mass: f32) {
        self.mass = mass;
        self.inverse_mass = if mass > 0.0 { 1.0 / mass } else { 0.0 };
    }

    pub fn buoyancy(&self) -> f32 {
        self.buoyancy_factor
    }

    /// Set the fraction of gravity cancelled by buoyancy, clamped to [0, 1].
    pub fn set_buoyancy(&mut self, factor: f32) {
        self.buoyancy_factor = factor.clamp(0.0, 1.0);
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Mark the particle for removal on the next cull.
    pub fn kill(&mut self) {
        self.alive = false;
    }

    /// Force accumulated since the last clear.
    pub fn accumulated_force(&self) -> Vec2 {
        self.force_accumulator
    }

    /// Add a force for the current step.
    #[inline]
    pub fn apply_force(&mut self, force: Vec2) {
        self.force_accumulator += force;
    }

    /// Instantaneous change of momentum: `v += j / m`.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse * self.inverse_mass;
    }

    #[inline]
    pub fn clear_forces(&mut self) {
        self.force_accumulator = Vec2::zeros();
    }

    /// Advance position and velocity by `dt` using the accumulated force.
    ///
    /// Does not touch the force accumulator or age.
    pub fn integrate(&mut self, dt: f32, scheme: IntegrationScheme) {
        self.acceleration = self.force_accumulator * self.inverse_mass;

        match scheme {
            IntegrationScheme::Euler => {
                let old_velocity = self.velocity;
                self.velocity += self.acceleration * dt;
                self.position += old_velocity * dt;
            }
            IntegrationScheme::SemiImplicit => {
                self.velocity += self.acceleration * dt;
                self.position += self.velocity * dt;
            }
            IntegrationScheme::Verlet => {
                if dt <= 0.0 {
                    return;
                }
                if !self.verlet_seeded {
                    self.prev_position = self.position - self.velocity * dt;
                    self.verlet_seeded = true;
                }
                let current = self.position;
                self.position =
                    current * 2.0 - self.prev_position + self.acceleration * (dt * dt);
                self.prev_position = current;
                self.velocity = (self.position - self.prev_position) / dt;
            }
        }
    }

    /// Scale velocity down to `max_speed` if it is faster.
    ///
    /// Under Verlet the previous position is rewritten too, otherwise the
    /// next step would rederive the unclamped velocity.
    pub fn clamp_velocity(&mut self, max_speed: f32, dt: f32, scheme: IntegrationScheme) {
        if self.velocity.magnitude() <= max_speed {
            return;
        }
        self.velocity = self.velocity.clamped(max_speed);
        if scheme == IntegrationScheme::Verlet && self.verlet_seeded {
            self.prev_position = self.position - self.velocity * dt;
        }
    }

    /// Count one more update and evaluate the lifetime.
    ///
    /// Returns the liveness after aging.
    pub fn advance_age(&mut self) -> bool {
        self.age = self.age.saturating_add(1);
        if self.max_age > 0 && i64::from(self.age) >= i64::from(self.max_age) {
            self.alive = false;
        }
        self.alive
    }

    /// Speed in cells per time unit.
    pub fn speed(&self) -> f32 {
        self.velocity.magnitude()
    }
}
