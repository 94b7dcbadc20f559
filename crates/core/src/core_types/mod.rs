//! Core value types shared by every subsystem.

pub mod noise;
pub mod vec2;

pub use noise::{
    DomainWarp, FractalNoise, NoiseConfig, NoiseSource, PerlinNoise, SimplexNoise,
};
pub use vec2::{Vec2, Vec2Ext};
