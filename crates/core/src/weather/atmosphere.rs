//! Atmospheric derivations over an immutable state snapshot.
//!
//! Pure functions for pressure and temperature aloft, air density, moisture,
//! Pasquill-Gifford stability classes, and the comfort indices shown beside
//! the scene.
//!
//! # Models
//!
//! ```text
//! Barometric:   P(h) = P₀ · exp(-M·g·h / (R·T))
//! Lapse rate:   T(h) = T₀ - Γ·h          (Γ = 9.8 K/km dry, 6 K/km moist)
//! Ideal gas:    ρ = P·M / (R·T)
//! Magnus:       e_s = 611.2 · exp(17.67·T / (T + 243.5))
//! Virtual temp: T_v = T · (1 + 0.61·q),  q = 0.622·e / (P - 0.378·e)
//! ```
//!
//! # References
//!
//! - Wallace, J.M., Hobbs, P.V. (2006). "Atmospheric Science: An Introductory Survey."
//! - Pasquill, F. (1961). "The estimation of the dispersion of windborne material."
//!   Meteorological Magazine, 90, 33-49.
//! - Rothfusz, L.P. (1990). "The heat index equation." NWS Technical Attachment SR 90-23.
//! - Osczevski, R., Bluestein, M. (2005). "The new wind chill equivalent temperature chart."
//!   Bulletin of the American Meteorological Society, 86(10), 1453-1458.

use crate::core_types::vec2::Vec2;
use serde::{Deserialize, Serialize};

/// Universal gas constant (J/(mol·K)).
pub const R_GAS: f32 = 8.314462;
/// Molar mass of dry air (kg/mol).
pub const M_AIR: f32 = 0.0289644;
/// Standard gravity (m/s²).
pub const G_EARTH: f32 = 9.80665;
/// Standard sea-level pressure (Pa).
pub const P_SEA_LEVEL: f32 = 101_325.0;
pub const KELVIN_OFFSET: f32 = 273.15;
/// Dry adiabatic lapse rate (K/m).
pub const LAPSE_RATE_DRY: f32 = 0.0098;
/// Approximate saturated lapse rate (K/m).
pub const LAPSE_RATE_MOIST: f32 = 0.006;

/// Snapshot of surface conditions. Never mutated; build a new one instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphericState {
    pub temperature_c: f32,
    pub pressure_hpa: f32,
    pub humidity_percent: f32,
    pub wind_speed_ms: f32,
    /// Direction the wind blows from, degrees clockwise from north.
    pub wind_direction_deg: f32,
    pub cloud_cover_percent: f32,
    pub dew_point_c: f32,
}

impl Default for AtmosphericState {
    fn default() -> Self {
        Self {
            temperature_c: 20.0,
            pressure_hpa: 1013.25,
            humidity_percent: 50.0,
            wind_speed_ms: 5.0,
            wind_direction_deg: 0.0,
            cloud_cover_percent: 0.0,
            dew_point_c: 10.0,
        }
    }
}

impl AtmosphericState {
    pub fn temperature_k(&self) -> f32 {
        self.temperature_c + KELVIN_OFFSET
    }

    pub fn pressure_pa(&self) -> f32 {
        self.pressure_hpa * 100.0
    }

    /// Meteorological wind components `(u, v)` in m/s (east, north).
    pub fn wind_vector(&self) -> Vec2 {
        let rad = self.wind_direction_deg.to_radians();
        Vec2::new(
            -self.wind_speed_ms * rad.sin(),
            -self.wind_speed_ms * rad.cos(),
        )
    }
}

/// Pasquill-Gifford stability class, most to least convective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    /// A: strong daytime convection.
    VeryUnstable,
    /// B: moderate convection.
    Unstable,
    /// C: weak convection.
    SlightlyUnstable,
    /// D: overcast or windy.
    Neutral,
    /// E: light wind, clear night.
    SlightlyStable,
    /// F: calm night.
    Stable,
}

impl StabilityClass {
    /// Base turbulence before the wind contribution.
    pub fn turbulence_coefficient(self) -> f32 {
        match self {
            StabilityClass::VeryUnstable => 0.9,
            StabilityClass::Unstable => 0.7,
            StabilityClass::SlightlyUnstable => 0.5,
            StabilityClass::Neutral => 0.3,
            StabilityClass::SlightlyStable => 0.15,
            StabilityClass::Stable => 0.05,
        }
    }

    /// Convective multiplier for thermals; zero for stable classes.
    pub fn updraft_multiplier(self) -> f32 {
        match self {
            StabilityClass::VeryUnstable => 2.0,
            StabilityClass::Unstable => 1.5,
            StabilityClass::SlightlyUnstable => 1.0,
            StabilityClass::Neutral => 0.3,
            StabilityClass::SlightlyStable | StabilityClass::Stable => 0.0,
        }
    }

    pub fn is_stable(self) -> bool {
        matches!(self, StabilityClass::SlightlyStable | StabilityClass::Stable)
    }

    /// Pasquill letter, `A` through `F`.
    pub fn letter(self) -> char {
        match self {
            StabilityClass::VeryUnstable => 'A',
            StabilityClass::Unstable => 'B',
            StabilityClass::SlightlyUnstable => 'C',
            StabilityClass::Neutral => 'D',
            StabilityClass::SlightlyStable => 'E',
            StabilityClass::Stable => 'F',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindBand {
    Calm,
    Light,
    Moderate,
    Strong,
}

impl WindBand {
    fn of(speed_ms: f32) -> Self {
        if speed_ms < 2.0 {
            WindBand::Calm
        } else if speed_ms < 5.0 {
            WindBand::Light
        } else if speed_ms < 8.0 {
            WindBand::Moderate
        } else {
            WindBand::Strong
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloudBand {
    Clear,
    Broken,
    Overcast,
}

impl CloudBand {
    fn of(cover_percent: f32) -> Self {
        if cover_percent < 30.0 {
            CloudBand::Clear
        } else if cover_percent < 70.0 {
            CloudBand::Broken
        } else {
            CloudBand::Overcast
        }
    }
}

/// Lapse rate used for temperature aloft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapseRate {
    #[default]
    Dry,
    Moist,
}

impl LapseRate {
    /// Kelvin per metre.
    pub fn kelvin_per_meter(self) -> f32 {
        match self {
            LapseRate::Dry => LAPSE_RATE_DRY,
            LapseRate::Moist => LAPSE_RATE_MOIST,
        }
    }
}

/// Derivations over an [`AtmosphericState`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AtmosphericModel {
    state: AtmosphericState,
}

impl AtmosphericModel {
    pub fn new(state: AtmosphericState) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &AtmosphericState {
        &self.state
    }

    /// Pressure at `altitude_m` above the surface, in hPa.
    pub fn pressure_at_altitude(&self, altitude_m: f32) -> f32 {
        let exponent = -(M_AIR * G_EARTH * altitude_m) / (R_GAS * self.state.temperature_k());
        self.state.pressure_pa() * exponent.exp() / 100.0
    }

    /// Temperature at `altitude_m`, in °C.
    pub fn temperature_at_altitude(&self, altitude_m: f32, lapse: LapseRate) -> f32 {
        self.state.temperature_c - lapse.kelvin_per_meter() * altitude_m
    }

    /// Dry-air density at `altitude_m`, in kg/m³.
    pub fn air_density(&self, altitude_m: f32) -> f32 {
        let p = self.pressure_at_altitude(altitude_m) * 100.0;
        let t = self.temperature_at_altitude(altitude_m, LapseRate::Dry) + KELVIN_OFFSET;
        (p * M_AIR) / (R_GAS * t)
    }

    /// Magnus saturation vapor pressure over water, in Pa.
    pub fn saturation_vapor_pressure(temp_c: f32) -> f32 {
        611.2 * ((17.67 * temp_c) / (temp_c + 243.5)).exp()
    }

    /// Virtual temperature in K, accounting for water vapor.
    pub fn virtual_temperature(&self) -> f32 {
        let e_sat = Self::saturation_vapor_pressure(self.state.temperature_c);
        let e = e_sat * self.state.humidity_percent / 100.0;
        let q = 0.622 * e / (self.state.pressure_pa() - 0.378 * e);
        self.state.temperature_k() * (1.0 + 0.61 * q)
    }

    /// Daytime stability class from wind and cloud bands.
    ///
    /// `Stable` is never produced by this table. The strong-wind row only
    /// turns neutral strictly above 70% cover.
    pub fn classify_stability(&self) -> StabilityClass {
        use CloudBand::{Broken, Clear, Overcast};
        use WindBand::{Calm, Light, Moderate, Strong};

        let cover = self.state.cloud_cover_percent;
        match (WindBand::of(self.state.wind_speed_ms), CloudBand::of(cover)) {
            (Calm, Clear) => StabilityClass::VeryUnstable,
            (Calm, Broken) | (Light, Clear) => StabilityClass::Unstable,
            (Light, Broken) => StabilityClass::SlightlyUnstable,
            (Calm | Light | Moderate, Overcast) | (Moderate, Clear | Broken) => {
                StabilityClass::Neutral
            }
            (Strong, _) if cover > 70.0 => StabilityClass::Neutral,
            (Strong, _) => StabilityClass::SlightlyStable,
        }
    }

    /// Turbulence factor in [0, 1] from stability and wind speed.
    pub fn turbulence_intensity(&self) -> f32 {
        let base = self.classify_stability().turbulence_coefficient();
        let wind_factor = (self.state.wind_speed_ms / 15.0).min(1.0);
        (base + wind_factor * 0.3).min(1.0)
    }

    /// Thermal updraft speed for a relative solar intensity in [0, 1].
    pub fn thermal_updraft_strength(&self, solar_intensity: f32) -> f32 {
        let stability = self.classify_stability();
        if stability.is_stable() {
            return 0.0;
        }
        0.5 * solar_intensity * stability.updraft_multiplier()
    }

    /// Visibility in metres, stepped by relative humidity.
    pub fn visibility_estimate(&self) -> f32 {
        let rh = self.state.humidity_percent;
        if rh >= 100.0 {
            100.0
        } else if rh >= 95.0 {
            500.0
        } else if rh >= 90.0 {
            2000.0
        } else if rh >= 80.0 {
            5000.0
        } else {
            10_000.0 + (100.0 - rh) * 100.0
        }
    }
}

/// Wind chill (Environment Canada), °C.
///
/// Returns `temp_c` unchanged unless `temp_c < 10` and the wind exceeds 4.8 km/h.
pub fn calculate_wind_chill(temp_c: f32, wind_speed_ms: f32) -> f32 {
    let wind_kmh = wind_speed_ms * 3.6;
    if temp_c >= 10.0 || wind_kmh <= 4.8 {
        return temp_c;
    }
    let v16 = wind_kmh.powf(0.16);
    13.12 + 0.6215 * temp_c - 11.37 * v16 + 0.3965 * temp_c * v16
}

/// Heat index (NOAA Rothfusz regression), °C.
///
/// Returns `temp_c` unchanged unless `temp_c > 27` and humidity exceeds 40 %.
pub fn calculate_heat_index(temp_c: f32, humidity_percent: f32) -> f32 {
    if temp_c <= 27.0 || humidity_percent <= 40.0 {
        return temp_c;
    }
    let t = temp_c * 9.0 / 5.0 + 32.0;
    let rh = humidity_percent;
    let hi_f = -42.379 + 2.049_015_2 * t + 10.143_331 * rh
        - 0.224_755_4 * t * rh
        - 6.83783e-3 * t * t
        - 5.481717e-2 * rh * rh
        + 1.22874e-3 * t * t * rh
        + 8.5282e-4 * t * rh * rh
        - 1.99e-6 * t * t * rh * rh;
    (hi_f - 32.0) * 5.0 / 9.0
}

/// Dew point from temperature and relative humidity (inverse Magnus), °C.
pub fn dew_point(temp_c: f32, humidity_percent: f32) -> f32 {
    let rh = humidity_percent.clamp(0.1, 100.0);
    let gamma = (rh / 100.0).ln() + (17.67 * temp_c) / (temp_c + 243.5);
    243.5 * gamma / (17.67 - gamma)
}
