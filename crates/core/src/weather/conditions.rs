//! Weather categories and how each one looks on screen.
//!
//! A [`WeatherReading`] is the record handed in by whatever fetches the
//! weather. Its [`WeatherCondition`] selects a [`PrecipitationProfile`]: how
//! many particles to spawn and how they move, which glyphs and colors to use,
//! how much sky the clouds fill, and whether lightning strikes.

use crate::config::ConfigError;
use crate::render::ColorId;
use crate::weather::atmosphere::{dew_point, AtmosphericState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Broad weather category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    FreezingRain,
    Snow,
    HeavySnow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    pub const ALL: [WeatherCondition; 12] = [
        WeatherCondition::Clear,
        WeatherCondition::PartlyCloudy,
        WeatherCondition::Cloudy,
        WeatherCondition::Fog,
        WeatherCondition::Drizzle,
        WeatherCondition::Rain,
        WeatherCondition::HeavyRain,
        WeatherCondition::FreezingRain,
        WeatherCondition::Snow,
        WeatherCondition::HeavySnow,
        WeatherCondition::Thunderstorm,
        WeatherCondition::Unknown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::PartlyCloudy => "partly_cloudy",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Fog => "fog",
            WeatherCondition::Drizzle => "drizzle",
            WeatherCondition::Rain => "rain",
            WeatherCondition::HeavyRain => "heavy_rain",
            WeatherCondition::FreezingRain => "freezing_rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::HeavySnow => "heavy_snow",
            WeatherCondition::Thunderstorm => "thunderstorm",
            WeatherCondition::Unknown => "unknown",
        }
    }

    /// Particle and cloud parameters for this category.
    pub fn profile(self) -> PrecipitationProfile {
        PrecipitationProfile::for_condition(self)
    }
}

impl fmt::Display for WeatherCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WeatherCondition {
    type Err = ConfigError;

    /// Parses `heavy_rain`, `heavy-rain`, or `Heavy-Rain` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownCondition(s.to_string()))
    }
}

/// Weather snapshot supplied by the data collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherReading {
    pub condition: WeatherCondition,
    pub temperature_c: f32,
    pub wind_speed_ms: f32,
    /// Degrees clockwise from north.
    pub wind_direction_deg: f32,
    pub humidity_percent: f32,
    pub cloud_cover_percent: f32,
    pub pressure_hpa: f32,
}

impl Default for WeatherReading {
    fn default() -> Self {
        Self {
            condition: WeatherCondition::Clear,
            temperature_c: 20.0,
            wind_speed_ms: 5.0,
            wind_direction_deg: 0.0,
            humidity_percent: 50.0,
            cloud_cover_percent: 0.0,
            pressure_hpa: 1013.25,
        }
    }
}

impl WeatherReading {
    pub fn new(condition: WeatherCondition) -> Self {
        Self {
            condition,
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature_c: f32) -> Self {
        self.temperature_c = temperature_c;
        self
    }

    pub fn with_wind(mut self, speed_ms: f32, direction_deg: f32) -> Self {
        self.wind_speed_ms = speed_ms;
        self.wind_direction_deg = direction_deg;
        self
    }

    pub fn with_humidity(mut self, humidity_percent: f32) -> Self {
        self.humidity_percent = humidity_percent;
        self
    }

    pub fn with_cloud_cover(mut self, cloud_cover_percent: f32) -> Self {
        self.cloud_cover_percent = cloud_cover_percent;
        self
    }

    pub fn with_pressure(mut self, pressure_hpa: f32) -> Self {
        self.pressure_hpa = pressure_hpa;
        self
    }

    /// Atmospheric snapshot with the dew point derived from temperature and humidity.
    pub fn atmospheric_state(&self) -> AtmosphericState {
        AtmosphericState {
            temperature_c: self.temperature_c,
            pressure_hpa: self.pressure_hpa,
            humidity_percent: self.humidity_percent.clamp(0.0, 100.0),
            wind_speed_ms: self.wind_speed_ms.max(0.0),
            wind_direction_deg: self.wind_direction_deg,
            cloud_cover_percent: self.cloud_cover_percent.clamp(0.0, 100.0),
            dew_point_c: dew_point(self.temperature_c, self.humidity_percent),
        }
    }
}

/// Spawn, motion, and sky parameters for one weather category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecipitationProfile {
    /// Particles spawned on each spawning frame at full quality.
    pub spawn_count: u32,
    /// Spawn every `spawn_interval` frames.
    pub spawn_interval: u32,
    pub glyphs: &'static [char],
    pub color: ColorId,
    pub mass: f32,
    pub velocity_x: (f32, f32),
    pub velocity_y: (f32, f32),
    pub drag_coefficient: f32,
    pub buoyancy: f32,
    pub max_age: i32,
    /// Multiplier on configured gravity.
    pub gravity_scale: f32,
    /// Multiplier on configured air resistance.
    pub drag_scale: f32,
    /// Particles feel the turbulent part of the wind.
    pub turbulent: bool,
    pub has_lightning: bool,
    /// First screen row covered by clouds.
    pub cloud_top: u16,
    /// Number of cloud rows; zero for an empty sky.
    pub cloud_rows: u16,
    /// Offset added to the cover-derived cloud threshold. Negative is denser.
    pub cloud_bias: f32,
    pub cloud_color: ColorId,
}

const RAIN_GLYPHS: &[char] = &['│', '|', '┃', ':'];
const STORM_GLYPHS: &[char] = &['┃', '║', '│'];
const SNOW_GLYPHS: &[char] = &['*', '❄', '❅', '·', '°'];
const DRIZZLE_GLYPHS: &[char] = &[':', '.', '\''];
const SLEET_GLYPHS: &[char] = &[',', '|', ':'];

impl PrecipitationProfile {
    const DRY: PrecipitationProfile = PrecipitationProfile {
        spawn_count: 0,
        spawn_interval: 1,
        glyphs: &[],
        color: ColorId::WHITE,
        mass: 1.0,
        velocity_x: (0.0, 0.0),
        velocity_y: (0.0, 0.0),
        drag_coefficient: 0.47,
        buoyancy: 0.0,
        max_age: -1,
        gravity_scale: 1.0,
        drag_scale: 1.0,
        turbulent: false,
        has_lightning: false,
        cloud_top: 2,
        cloud_rows: 0,
        cloud_bias: 0.0,
        cloud_color: ColorId::WHITE,
    };

    const RAIN: PrecipitationProfile = PrecipitationProfile {
        spawn_count: 3,
        spawn_interval: 2,
        glyphs: RAIN_GLYPHS,
        color: ColorId::CYAN,
        mass: 0.5,
        velocity_x: (-0.3, 0.3),
        velocity_y: (1.5, 3.0),
        drag_coefficient: 0.3,
        buoyancy: 0.0,
        max_age: 200,
        gravity_scale: 1.0,
        drag_scale: 1.0,
        turbulent: false,
        has_lightning: false,
        cloud_top: 2,
        cloud_rows: 6,
        cloud_bias: -0.1,
        cloud_color: ColorId::WHITE,
    };

    const SNOW: PrecipitationProfile = PrecipitationProfile {
        spawn_count: 2,
        spawn_interval: 3,
        glyphs: SNOW_GLYPHS,
        color: ColorId::WHITE,
        mass: 0.2,
        velocity_x: (-0.3, 0.3),
        velocity_y: (0.2, 0.8),
        drag_coefficient: 0.8,
        buoyancy: 0.4,
        max_age: 400,
        gravity_scale: 0.5,
        drag_scale: 1.5,
        turbulent: true,
        has_lightning: false,
        cloud_top: 2,
        cloud_rows: 6,
        cloud_bias: 0.0,
        cloud_color: ColorId::WHITE,
    };

    pub fn for_condition(condition: WeatherCondition) -> Self {
        match condition {
            WeatherCondition::Clear | WeatherCondition::Unknown => Self::DRY,
            WeatherCondition::PartlyCloudy => Self {
                cloud_rows: 6,
                cloud_bias: 0.2,
                ..Self::DRY
            },
            WeatherCondition::Cloudy => Self {
                cloud_rows: 8,
                ..Self::DRY
            },
            WeatherCondition::Fog => Self {
                cloud_top: 0,
                cloud_rows: u16::MAX,
                cloud_bias: -0.2,
                ..Self::DRY
            },
            WeatherCondition::Drizzle => Self {
                spawn_count: 2,
                glyphs: DRIZZLE_GLYPHS,
                velocity_y: (1.0, 2.0),
                gravity_scale: 0.8,
                ..Self::RAIN
            },
            WeatherCondition::Rain => Self::RAIN,
            WeatherCondition::HeavyRain => Self {
                spawn_count: 5,
                gravity_scale: 1.1,
                cloud_bias: -0.2,
                ..Self::RAIN
            },
            WeatherCondition::FreezingRain => Self {
                glyphs: SLEET_GLYPHS,
                color: ColorId::BLUE,
                mass: 0.6,
                ..Self::RAIN
            },
            WeatherCondition::Snow => Self::SNOW,
            WeatherCondition::HeavySnow => Self {
                spawn_count: 4,
                gravity_scale: 0.6,
                cloud_bias: -0.1,
                ..Self::SNOW
            },
            WeatherCondition::Thunderstorm => Self {
                spawn_count: 8,
                glyphs: STORM_GLYPHS,
                color: ColorId::BLUE,
                mass: 0.8,
                velocity_x: (-0.5, 0.5),
                velocity_y: (2.0, 4.0),
                gravity_scale: 1.2,
                turbulent: true,
                has_lightning: true,
                cloud_rows: 8,
                cloud_bias: -0.3,
                cloud_color: ColorId::BLACK,
                ..Self::RAIN
            },
        }
    }

    pub fn spawns_particles(&self) -> bool {
        self.spawn_count > 0 && !self.glyphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn parses_snake_and_kebab_names() {
        assert_eq!("heavy_rain".parse::<WeatherCondition>().unwrap(), WeatherCondition::HeavyRain);
        assert_eq!("Heavy-Rain".parse::<WeatherCondition>().unwrap(), WeatherCondition::HeavyRain);
        assert_eq!(" thunderstorm ".parse::<WeatherCondition>().unwrap(), WeatherCondition::Thunderstorm);
        for condition in WeatherCondition::ALL {
            assert_eq!(condition.to_string().parse::<WeatherCondition>().unwrap(), condition);
        }
    }

    #[test]
    fn unknown_name_is_an_error() {
        let err = "hail".parse::<WeatherCondition>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownCondition(ref s) if s == "hail"));
    }

    #[test]
    fn dry_conditions_spawn_nothing() {
        for condition in [
            WeatherCondition::Clear,
            WeatherCondition::PartlyCloudy,
            WeatherCondition::Cloudy,
            WeatherCondition::Fog,
            WeatherCondition::Unknown,
        ] {
            assert!(!condition.profile().spawns_particles(), "{condition}");
        }
    }

    #[test]
    fn heavier_variants_spawn_more() {
        assert!(WeatherCondition::HeavyRain.profile().spawn_count > WeatherCondition::Rain.profile().spawn_count);
        assert!(WeatherCondition::HeavySnow.profile().spawn_count > WeatherCondition::Snow.profile().spawn_count);
        assert!(WeatherCondition::Thunderstorm.profile().has_lightning);
        assert!(!WeatherCondition::Rain.profile().has_lightning);
    }

    #[test]
    fn snow_is_buoyant_and_draggy() {
        let snow = WeatherCondition::Snow.profile();
        let rain = WeatherCondition::Rain.profile();
        assert!(snow.buoyancy > rain.buoyancy);
        assert!(snow.drag_coefficient > rain.drag_coefficient);
        assert!(snow.gravity_scale < rain.gravity_scale);
    }

    #[test]
    fn reading_builds_state_with_dew_point() {
        let reading = WeatherReading::new(WeatherCondition::Rain)
            .with_temperature(12.0)
            .with_humidity(100.0)
            .with_cloud_cover(140.0);
        let state = reading.atmospheric_state();
        assert_relative_eq!(state.dew_point_c, 12.0, epsilon = 1e-3);
        assert_eq!(state.cloud_cover_percent, 100.0);
    }

    #[test]
    fn reading_deserializes_with_defaults() {
        let reading: WeatherReading =
            serde_json::from_str(r#"{"condition":"heavy_snow","temperature_c":-4.0}"#).unwrap();
        assert_eq!(reading.condition, WeatherCondition::HeavySnow);
        assert_eq!(reading.temperature_c, -4.0);
        assert_eq!(reading.pressure_hpa, 1013.25);
    }
}
