//! Force generators applied additively to each particle's accumulator.
//!
//! Generators are registered on a [`ParticleSystem`](super::ParticleSystem)
//! and shared read-only across all particles during a sub-step. Time-varying
//! generators advance their internal clock in [`ForceGenerator::advance`],
//! which the system calls once per sub-step before touching any particle.
//!
//! # Force laws
//!
//! ```text
//! gravity    F = dir · m · g · (1 - buoyancy)
//! drag       |F| = min(k · |v|² · Cd, 0.99 · |v| · m / dt), opposite v
//! wind       F = (w + turbulence(x, y) - v) · 0.1 · Cd
//! turbulence F = (n(x·0.1 + t, y·0.1), n(x·0.1 + 100, y·0.1 + t)) · strength
//! ```

use crate::core_types::noise::{FractalNoise, NoiseConfig, NoiseSource};
use crate::core_types::vec2::{Vec2, Vec2Ext};
use crate::physics::particle::Particle;

/// Wind pulls a particle's velocity toward the local wind at this rate.
const WIND_RELAXATION: f32 = 0.1;

/// Fraction of the momentum-reversal limit drag may reach in one step.
const DRAG_CAP_SAFETY: f32 = 0.99;

/// Below this squared speed drag is not applied.
const DRAG_MIN_SPEED_SQ: f32 = 0.0001;

/// A contribution to the net force on a particle.
pub trait ForceGenerator: Send + Sync {
    /// Add this generator's force for a step of length `dt`.
    fn apply(&self, particle: &mut Particle, dt: f32);

    /// Advance internal time by one sub-step. Stateless generators ignore it.
    fn advance(&mut self, _dt: f32) {}

    /// Short label for logs and stats.
    fn name(&self) -> &'static str;
}

/// Gravity reduced by each particle's buoyancy factor.
#[derive(Debug, Clone, Copy)]
pub struct GravityForce {
    pub gravity: f32,
    pub direction: Vec2,
}

impl GravityForce {
    /// Gravity pulling toward `+y` (down the screen).
    pub fn new(gravity: f32) -> Self {
        Self {
            gravity,
            direction: Vec2::new(0.0, 1.0),
        }
    }

    pub fn with_direction(mut self, direction: Vec2) -> Self {
        self.direction = direction.normalized_or_zero();
        self
    }
}

impl Default for GravityForce {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ForceGenerator for GravityForce {
    fn apply(&self, particle: &mut Particle, _dt: f32) {
        let effective_g = self.gravity * (1.0 - particle.buoyancy());
        particle.apply_force(self.direction * (particle.mass() * effective_g));
    }

    fn name(&self) -> &'static str {
        "gravity"
    }
}

/// Quadratic air drag.
///
/// The magnitude is capped at `0.99 · |v| · m / dt` using the step's own `dt`,
/// so one step removes at most 99% of the current velocity and never reverses
/// it. With sub-stepping the cap is evaluated against the sub-step length.
#[derive(Debug, Clone, Copy)]
pub struct DragForce {
    pub coefficient: f32,
}

impl DragForce {
    pub fn new(coefficient: f32) -> Self {
        Self { coefficient }
    }
}

impl Default for DragForce {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl ForceGenerator for DragForce {
    fn apply(&self, particle: &mut Particle, dt: f32) {
        let velocity = particle.velocity;
        let speed_sq = velocity.magnitude_squared();
        if speed_sq <= DRAG_MIN_SPEED_SQ {
            return;
        }

        let mut magnitude = self.coefficient * speed_sq * particle.drag_coefficient;
        if dt > 0.0 {
            let max_drag = speed_sq.sqrt() * particle.mass() / dt;
            magnitude = magnitude.min(max_drag * DRAG_CAP_SAFETY);
        }

        particle.apply_force(-velocity.normalized_or_zero() * magnitude);
    }

    fn name(&self) -> &'static str {
        "drag"
    }
}

/// Time-varying turbulent wind sampled from fractal Perlin noise.
#[derive(Debug, Clone)]
pub struct TurbulenceField {
    noise: FractalNoise,
    /// Peak speed added to the base wind.
    pub strength: f32,
    /// Multiplier from screen cells to noise coordinates.
    pub spatial_scale: f32,
    time: f32,
}

impl TurbulenceField {
    pub fn new(seed: u64, strength: f32) -> Self {
        Self {
            noise: FractalNoise::new(NoiseConfig::with_seed(seed).with_octaves(3)),
            strength,
            spatial_scale: 0.02,
            time: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn sample(&self, x: f32, y: f32) -> Vec2 {
        let sx = x * self.spatial_scale;
        let sy = y * self.spatial_scale;
        Vec2::new(
            self.noise.sample(sx + self.time, sy),
            self.noise.sample(sx + 100.0, sy + self.time),
        ) * self.strength
    }
}

/// Source of the turbulent component of a [`WindForce`].
pub enum Turbulence {
    Field(TurbulenceField),
    Custom(Box<dyn Fn(f32, f32) -> Vec2 + Send + Sync>),
}

impl Turbulence {
    fn sample(&self, x: f32, y: f32) -> Vec2 {
        match self {
            Turbulence::Field(field) => field.sample(x, y),
            Turbulence::Custom(f) => f(x, y),
        }
    }
}

impl std::fmt::Debug for Turbulence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Turbulence::Field(field) => f.debug_tuple("Field").field(field).finish(),
            Turbulence::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Relative-velocity relaxation toward a (possibly turbulent) wind field.
#[derive(Debug)]
pub struct WindForce {
    pub base_velocity: Vec2,
    turbulence: Option<Turbulence>,
}

impl WindForce {
    pub fn new(base_velocity: Vec2) -> Self {
        Self {
            base_velocity,
            turbulence: None,
        }
    }

    pub fn with_turbulence_field(mut self, field: TurbulenceField) -> Self {
        self.turbulence = Some(Turbulence::Field(field));
        self
    }

    pub fn with_turbulence_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(f32, f32) -> Vec2 + Send + Sync + 'static,
    {
        self.turbulence = Some(Turbulence::Custom(Box::new(f)));
        self
    }

    /// Wind velocity at a screen position.
    pub fn wind_at(&self, x: f32, y: f32) -> Vec2 {
        match &self.turbulence {
            Some(t) => self.base_velocity + t.sample(x, y),
            None => self.base_velocity,
        }
    }
}

impl ForceGenerator for WindForce {
    fn apply(&self, particle: &mut Particle, _dt: f32) {
        let wind = self.wind_at(particle.position.x, particle.position.y);
        let relative = wind - particle.velocity;
        particle.apply_force(relative * WIND_RELAXATION * particle.drag_coefficient);
    }

    fn advance(&mut self, dt: f32) {
        if let Some(Turbulence::Field(field)) = &mut self.turbulence {
            field.advance(dt);
        }
    }

    fn name(&self) -> &'static str {
        "wind"
    }
}

/// Position- and time-dependent pseudo-random force.
#[derive(Debug, Clone)]
pub struct TurbulenceForce<N = FractalNoise> {
    noise: N,
    pub strength: f32,
    pub time_scale: f32,
    time: f32,
}

impl TurbulenceForce<FractalNoise> {
    pub fn new(seed: u64, strength: f32) -> Self {
        Self::with_noise(FractalNoise::new(NoiseConfig::with_seed(seed)), strength)
    }
}

impl<N: NoiseSource> TurbulenceForce<N> {
    pub fn with_noise(noise: N, strength: f32) -> Self {
        Self {
            noise,
            strength,
            time_scale: 0.1,
            time: 0.0,
        }
    }

    pub fn with_time_scale(mut self, time_scale: f32) -> Self {
        self.time_scale = time_scale;
        self
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

impl<N: NoiseSource> ForceGenerator for TurbulenceForce<N> {
    fn apply(&self, particle: &mut Particle, _dt: f32) {
        let x = particle.position.x * 0.1;
        let y = particle.position.y * 0.1;
        let fx = self.noise.sample(x + self.time, y) * self.strength;
        let fy = self.noise.sample(x + 100.0, y + self.time) * self.strength;
        particle.apply_force(Vec2::new(fx, fy));
    }

    fn advance(&mut self, dt: f32) {
        self.time += dt * self.time_scale;
    }

    fn name(&self) -> &'static str {
        "turbulence"
    }
}
