//! Stormscape Core Library
//!
//! A generative weather engine for character-cell displays. Weather readings
//! (condition, wind, temperature, humidity, pressure, cloud cover) become an
//! animated scene of falling particles, drifting noise clouds, and branching
//! lightning, drawn at a target frame rate under a soft time budget.
//!
//! ## Layers
//!
//! - Procedural noise: Perlin, simplex, fractal Brownian motion, domain warping
//! - Force-based particles with explicit Euler, semi-implicit Euler, and Verlet
//! - Atmospheric derivations: pressure, lapse rates, stability, comfort indices
//! - Layered render queue with frame budgeting and adaptive quality
//!
//! ```
//! use stormscape_core::{EngineConfig, GlyphBuffer, WeatherCondition, WeatherReading, WeatherScene};
//!
//! let reading = WeatherReading::new(WeatherCondition::Rain).with_wind(4.0, 270.0);
//! let mut scene = WeatherScene::new(40, 12, reading, EngineConfig::default());
//! let mut surface = GlyphBuffer::new(40, 12);
//! for _ in 0..5 {
//!     scene.frame(&mut surface);
//! }
//! assert_eq!(scene.report().total_frames, 5);
//! ```

// Configuration and errors
pub mod config;

// Math and noise primitives
pub mod core_types;

// Simulation
pub mod physics;
pub mod weather;

// Output
pub mod render;
pub mod scene;

// Re-export core types
pub use config::{ConfigError, EngineConfig, RenderConfig};
pub use core_types::{FractalNoise, NoiseConfig, NoiseSource, PerlinNoise, SimplexNoise, Vec2};

// Re-export simulation types
pub use physics::{IntegrationScheme, Particle, ParticleSystem, PhysicsConfig};
pub use weather::{AtmosphericModel, AtmosphericState, WeatherCondition, WeatherReading};

// Re-export output types
pub use render::{
    DrawSurface, FrameBudget, GlyphBuffer, PerformanceReport, RenderLayer, RenderQueue,
    RenderStats,
};
pub use scene::{FrameSummary, WeatherScene};
