//! Procedural cloud band drawn from thresholded fractal noise.

use crate::core_types::noise::{FractalNoise, NoiseConfig};
use crate::render::{ColorId, RenderLayer, RenderQueue};
use crate::weather::conditions::PrecipitationProfile;

/// Noise frequency across a row.
const X_FREQUENCY: f32 = 0.1;
/// Noise frequency down a column.
const Y_FREQUENCY: f32 = 0.2;

/// Drifting cloud density field.
///
/// Density is sampled at `(x·0.1 + t, y·0.2)`; `t` advances by
/// [`CloudLayer::TIME_STEP`] each frame, so clouds scroll sideways.
#[derive(Debug, Clone)]
pub struct CloudLayer {
    noise: FractalNoise,
    time: f32,
}

impl CloudLayer {
    pub const TIME_STEP: f32 = 0.02;

    pub fn new(seed: u64) -> Self {
        Self {
            noise: FractalNoise::new(NoiseConfig::with_seed(seed)),
            time: 0.0,
        }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Move the clouds forward one frame.
    pub fn advance(&mut self) {
        self.time += Self::TIME_STEP;
    }

    /// Density a cell must exceed to be drawn.
    ///
    /// Zero cover puts the threshold above any reachable density; full cover
    /// puts it below any.
    pub fn threshold(cover_percent: f32, bias: f32) -> f32 {
        let cover = (cover_percent / 100.0).clamp(0.0, 1.0);
        1.2 - 2.4 * cover + bias
    }

    /// Octave count at a quality level, never below one.
    pub fn octaves_for(&self, quality: f32) -> u32 {
        let base = self.noise.config().octaves as f32;
        ((base * quality.clamp(0.0, 1.0)).round() as u32).max(1)
    }

    pub fn density(&self, x: f32, y: f32, octaves: u32) -> f32 {
        self.noise
            .sample_octaves(x * X_FREQUENCY + self.time, y * Y_FREQUENCY, octaves)
    }

    pub fn glyph_for(density: f32) -> char {
        if density > 0.6 {
            '█'
        } else if density > 0.3 {
            '▓'
        } else if density > 0.0 {
            '▒'
        } else {
            '░'
        }
    }

    /// Queue cloud cells for the profile's rows. Returns the number queued.
    pub fn render(
        &self,
        queue: &mut RenderQueue,
        width: u16,
        height: u16,
        profile: &PrecipitationProfile,
        cover_percent: f32,
        quality: f32,
    ) -> usize {
        if profile.cloud_rows == 0 {
            return 0;
        }

        let threshold = Self::threshold(cover_percent, profile.cloud_bias);
        let octaves = self.octaves_for(quality);
        let top = profile.cloud_top.min(height);
        let bottom = top.saturating_add(profile.cloud_rows).min(height);
        let color: ColorId = profile.cloud_color;

        let mut drawn = 0;
        for y in top..bottom {
            for x in 0..width {
                let d = self.density(f32::from(x), f32::from(y), octaves);
                if d > threshold {
                    queue.add(
                        i32::from(x),
                        i32::from(y),
                        Self::glyph_for(d),
                        color,
                        RenderLayer::Clouds,
                    );
                    drawn += 1;
                }
            }
        }
        drawn
    }
}
