//! Particle collection, force registry, and the per-frame update loop.

use crate::config::ConfigError;
use crate::physics::forces::ForceGenerator;
use crate::physics::integration::IntegrationScheme;
use crate::physics::particle::Particle;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, trace, warn};

/// Distance beyond the bounds a particle may drift before it is culled.
pub const BOUNDS_MARGIN: f32 = 5.0;

/// Physics tuning for a [`ParticleSystem`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravitational acceleration in cells per step².
    pub gravity: f32,
    /// Quadratic drag coefficient.
    pub air_resistance: f32,
    /// Multiplier on the wind speed reaching particles.
    pub wind_strength: f32,
    pub integration: IntegrationScheme,
    /// Equal slices each update is divided into.
    pub substeps: u32,
    /// Speed limit enforced after every sub-step.
    pub max_velocity: f32,
    /// Cull particles that leave the bounds plus [`BOUNDS_MARGIN`].
    pub bounds_check: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            air_resistance: 0.02,
            wind_strength: 1.0,
            integration: IntegrationScheme::SemiImplicit,
            substeps: 1,
            max_velocity: 10.0,
            bounds_check: true,
        }
    }
}

impl PhysicsConfig {
    pub fn with_integration(mut self, integration: IntegrationScheme) -> Self {
        self.integration = integration;
        self
    }

    pub fn with_substeps(mut self, substeps: u32) -> Self {
        self.substeps = substeps;
        self
    }

    pub fn with_max_velocity(mut self, max_velocity: f32) -> Self {
        self.max_velocity = max_velocity;
        self
    }

    pub fn with_bounds_check(mut self, bounds_check: bool) -> Self {
        self.bounds_check = bounds_check;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.substeps == 0 {
            return Err(ConfigError::InvalidSubsteps);
        }
        if self.max_velocity.is_nan() || self.max_velocity <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "max_velocity",
                value: self.max_velocity,
            });
        }
        if self.air_resistance.is_nan() || self.air_resistance < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "air_resistance",
                value: self.air_resistance,
            });
        }
        Ok(())
    }

    /// Copy with out-of-range values replaced by usable ones.
    pub(crate) fn sanitized(mut self) -> Self {
        if self.substeps == 0 {
            warn!("substeps was 0; using 1");
            self.substeps = 1;
        }
        if self.max_velocity.is_nan() || self.max_velocity <= 0.0 {
            let fallback = Self::default().max_velocity;
            warn!(
                "max_velocity {} is not positive; using {}",
                self.max_velocity, fallback
            );
            self.max_velocity = fallback;
        }
        self
    }
}

/// Axis-aligned simulation rectangle in screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Bounds covering a `width` x `height` canvas anchored at the origin.
    pub fn from_size(width: u16, height: u16) -> Self {
        Self::new(0.0, 0.0, f32::from(width), f32::from(height))
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// True if `(x, y)` lies within the rectangle grown by `margin` on every side.
    pub fn contains_with_margin(&self, x: f32, y: f32, margin: f32) -> bool {
        x >= self.min_x - margin
            && x <= self.max_x + margin
            && y >= self.min_y - margin
            && y <= self.max_y + margin
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 100.0, 50.0)
    }
}

/// Counters describing a system's lifetime workload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
    pub active: usize,
    pub peak: usize,
    pub frames: u64,
    pub generators: usize,
}

/// Owns particles and force generators, and advances them each frame.
///
/// # Update
///
/// `update(dt)` divides `dt` into `substeps` equal slices. Each slice
/// advances the generators, then for every particle clears its forces,
/// applies every generator, integrates, and clamps speed. After the last
/// slice each particle ages by one, and dead or escaped particles are removed.
pub struct ParticleSystem {
    config: PhysicsConfig,
    bounds: Bounds,
    particles: Vec<Particle>,
    generators: Vec<Box<dyn ForceGenerator>>,
    frame_count: u64,
    active_count: usize,
    peak_count: usize,
}

impl ParticleSystem {
    pub fn new(config: PhysicsConfig, bounds: Bounds) -> Self {
        let config = config.sanitized();
        info!(
            "Particle system created: bounds=({:.1}, {:.1})-({:.1}, {:.1}), scheme={}, substeps={}",
            bounds.min_x,
            bounds.min_y,
            bounds.max_x,
            bounds.max_y,
            config.integration,
            config.substeps
        );
        Self {
            config,
            bounds,
            particles: Vec::new(),
            generators: Vec::new(),
            frame_count: 0,
            active_count: 0,
            peak_count: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn add_force_generator(&mut self, generator: Box<dyn ForceGenerator>) {
        self.generators.push(generator);
    }

    /// Drop every registered generator. Live particles are kept.
    pub fn clear_force_generators(&mut self) {
        self.generators.clear();
    }

    pub fn force_generators(&self) -> &[Box<dyn ForceGenerator>] {
        &self.generators
    }

    pub fn spawn(&mut self, particle: Particle) {
        self.particles.push(particle);
        self.peak_count = self.peak_count.max(self.particles.len());
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Remove all particles.
    pub fn clear(&mut self) {
        self.particles.clear();
        self.active_count = 0;
    }

    pub fn update(&mut self, dt: f32) {
        self.frame_count += 1;

        let substeps = self.config.substeps.max(1);
        let sub_dt = dt / substeps as f32;
        let scheme = self.config.integration;
        let max_velocity = self.config.max_velocity;

        for _ in 0..substeps {
            for generator in &mut self.generators {
                generator.advance(sub_dt);
            }

            let generators = &self.generators;
            let step = |particle: &mut Particle| {
                particle.clear_forces();
                for generator in generators {
                    generator.apply(particle, sub_dt);
                }
                particle.integrate(sub_dt, scheme);
                particle.clamp_velocity(max_velocity, sub_dt, scheme);
            };

            #[cfg(feature = "parallel")]
            self.particles.par_iter_mut().for_each(step);
            #[cfg(not(feature = "parallel"))]
            self.particles.iter_mut().for_each(step);
        }

        for particle in &mut self.particles {
            particle.advance_age();
        }

        let before = self.particles.len();
        let bounds = self.bounds;
        let check_bounds = self.config.bounds_check;
        self.particles.retain(|p| {
            p.is_alive()
                && (!check_bounds
                    || bounds.contains_with_margin(p.position.x, p.position.y, BOUNDS_MARGIN))
        });
        self.active_count = self.particles.len();

        trace!(
            "Particle update: {} active, {} culled, dt={:.3}",
            self.active_count,
            before - self.active_count,
            dt
        );
    }

    pub fn stats(&self) -> SystemStats {
        SystemStats {
            active: self.active_count,
            peak: self.peak_count,
            frames: self.frame_count,
            generators: self.generators.len(),
        }
    }
}

impl std::fmt::Debug for ParticleSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParticleSystem")
            .field("config", &self.config)
            .field("bounds", &self.bounds)
            .field("particles", &self.particles.len())
            .field(
                "generators",
                &self.generators.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
