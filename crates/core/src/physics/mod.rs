//! Force-based particle simulation.
//!
//! - [`Particle`]: point-mass state with a per-step force accumulator
//! - [`ForceGenerator`]: gravity, drag, wind, and turbulence contributions
//! - [`IntegrationScheme`]: explicit Euler, semi-implicit Euler, Verlet
//! - [`ParticleSystem`]: owns particles and generators and runs sub-steps

pub mod forces;
pub mod integration;
pub mod particle;
pub mod particle_system;

pub use forces::{
    DragForce, ForceGenerator, GravityForce, Turbulence, TurbulenceField, TurbulenceForce,
    WindForce,
};
pub use integration::IntegrationScheme;
pub use particle::Particle;
pub use particle_system::{Bounds, ParticleSystem, PhysicsConfig, SystemStats, BOUNDS_MARGIN};
