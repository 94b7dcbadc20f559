//! Weather: atmospheric physics, wind, conditions, clouds, and lightning.
//!
//! # Modules
//!
//! - [`atmosphere`]: barometric, lapse-rate, moisture, stability, comfort indices
//! - [`wind`]: power-law profile and stochastic gusts
//! - [`conditions`]: inbound weather reading and per-condition visual profiles
//! - [`clouds`]: noise-thresholded cloud band
//! - [`lightning`]: branching bolt generation and rasterization

pub mod atmosphere;
pub mod clouds;
pub mod conditions;
pub mod lightning;
pub mod wind;

pub use atmosphere::{
    calculate_heat_index, calculate_wind_chill, dew_point, AtmosphericModel, AtmosphericState,
    LapseRate, StabilityClass,
};
pub use clouds::CloudLayer;
pub use conditions::{PrecipitationProfile, WeatherCondition, WeatherReading};
pub use lightning::{bresenham, LightningBolt, LightningSegment};
pub use wind::WindModel;
