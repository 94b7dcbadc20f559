//! Surface wind with a power-law profile and stochastic gusts.
//!
//! Gusts are exponentially decaying impulses. A timer lapses every 0.5 to 3
//! seconds; on each lapse a new gust fires with probability proportional to
//! the turbulence intensity.

use crate::core_types::vec2::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Hellmann exponent for neutral stability over open terrain.
const POWER_LAW_ALPHA: f32 = 0.14;
/// Standard anemometer height (m).
const REFERENCE_HEIGHT: f32 = 10.0;
/// Gust decay rate (1/s).
const GUST_DECAY: f32 = 2.0;

/// Base wind plus a decaying gust component.
#[derive(Debug, Clone)]
pub struct WindModel {
    pub base_speed: f32,
    /// Degrees clockwise from north.
    pub base_direction_deg: f32,
    gust_state: f32,
    gust_timer: f32,
    rng: ChaCha8Rng,
}

impl WindModel {
    pub fn new(base_speed: f32, base_direction_deg: f32, seed: u64) -> Self {
        Self {
            base_speed,
            base_direction_deg,
            gust_state: 0.0,
            gust_timer: 0.0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Current gust speed on top of the base wind.
    pub fn gust(&self) -> f32 {
        self.gust_state
    }

    pub fn speed(&self) -> f32 {
        self.base_speed + self.gust_state
    }

    /// Wind speed at `height_m` from the power-law profile; zero at or below ground.
    pub fn wind_at_height(&self, height_m: f32) -> f32 {
        if height_m <= 0.0 {
            return 0.0;
        }
        self.base_speed * (height_m / REFERENCE_HEIGHT).powf(POWER_LAW_ALPHA)
    }

    /// Decay the current gust and possibly start a new one.
    ///
    /// `turbulence` is the intensity in [0, 1].
    pub fn update_gusts(&mut self, dt: f32, turbulence: f32) {
        self.gust_state *= (-GUST_DECAY * dt).exp();

        self.gust_timer -= dt;
        if self.gust_timer <= 0.0 {
            if self.rng.random::<f32>() < turbulence * 0.1 {
                self.gust_state = self.rng.random_range(0.5..2.0) * self.base_speed;
            }
            self.gust_timer = self.rng.random_range(0.5..3.0);
        }
    }

    /// Wind vector `(speed·sin θ, speed·cos θ)` including the gust.
    pub fn wind_vector(&self) -> Vec2 {
        let rad = self.base_direction_deg.to_radians();
        let speed = self.speed();
        Vec2::new(speed * rad.sin(), speed * rad.cos())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn power_law_profile() {
        let wind = WindModel::new(5.0, 0.0, 1);
        assert_eq!(wind.wind_at_height(0.0), 0.0);
        assert_eq!(wind.wind_at_height(-3.0), 0.0);
        assert_relative_eq!(wind.wind_at_height(10.0), 5.0);
        assert!(wind.wind_at_height(100.0) > 5.0);
    }

    #[test]
    fn gusts_decay_without_turbulence() {
        let mut wind = WindModel::new(5.0, 90.0, 7);
        wind.gust_state = 4.0;
        let mut previous = wind.gust();
        for _ in 0..50 {
            wind.update_gusts(0.1, 0.0);
            assert!(wind.gust() < previous);
            previous = wind.gust();
        }
        assert!(wind.gust() < 0.01);
    }

    #[test]
    fn full_turbulence_eventually_gusts() {
        let mut wind = WindModel::new(5.0, 0.0, 3);
        let gusted = (0..2000).any(|_| {
            wind.update_gusts(0.1, 1.0);
            wind.gust() > 2.0
        });
        assert!(gusted);
    }

    #[test]
    fn same_seed_same_gusts() {
        let mut a = WindModel::new(5.0, 0.0, 11);
        let mut b = WindModel::new(5.0, 0.0, 11);
        for _ in 0..500 {
            a.update_gusts(0.1, 1.0);
            b.update_gusts(0.1, 1.0);
            assert_eq!(a.gust().to_bits(), b.gust().to_bits());
        }
    }

    #[test]
    fn east_wind_vector() {
        let wind = WindModel::new(2.0, 90.0, 0);
        let v = wind.wind_vector();
        assert_relative_eq!(v.x, 2.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 0.0, epsilon = 1e-6);
    }
}
