//! Gradient noise generators for turbulence and cloud density.
//!
//! Provides deterministic, seed-driven 2D noise:
//! - [`PerlinNoise`]: classic gradient noise on a square grid
//! - [`SimplexNoise`]: gradient noise on a skewed triangular grid
//! - [`FractalNoise`]: fractal Brownian motion (fBm) over any base generator
//! - [`DomainWarp`]: two-pass coordinate warping for flow-like distortion
//!
//! # Determinism
//!
//! Every generator owns a permutation table built once from its seed with a
//! `ChaCha8Rng` shuffle of `0..=255`, doubled to 512 entries so corner lookups
//! never need a modulo. The table is never mutated afterwards, so the same
//! seed always yields bit-identical samples.
//!
//! # References
//!
//! - Perlin, K. (2002). Improving noise. ACM Transactions on Graphics, 21(3), 681-682.
//! - Gustavson, S. (2005). Simplex noise demystified.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Permutation table size (must be power of 2).
const PERM_SIZE: usize = 256;

/// Gradient directions for 2D Perlin noise (8 directions, unnormalized).
const GRADIENTS_2D: [(f32, f32); 8] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
];

/// Gradient table for simplex noise, indexed by `perm % 12`.
const GRADIENTS_SIMPLEX: [(f32, f32); 12] = [
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
    (1.0, 0.0),
    (-1.0, 0.0),
    (0.0, 1.0),
    (0.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (1.0, -1.0),
    (-1.0, -1.0),
];

/// Skew factor into simplex space: `(sqrt(3) - 1) / 2`.
const SKEW_2D: f32 = 0.366_025_42;

/// Unskew factor back to grid space: `(3 - sqrt(3)) / 6`.
const UNSKEW_2D: f32 = 0.211_324_87;

/// Scale bringing summed simplex contributions to roughly [-1, 1].
const SIMPLEX_SCALE: f32 = 70.0;

/// Anything that yields a scalar field over the plane.
///
/// Implemented by every generator in this module so fractal and warp layers
/// compose over any base.
pub trait NoiseSource: Send + Sync {
    /// Sample the field at `(x, y)`. Pure and total over all finite inputs.
    fn sample(&self, x: f32, y: f32) -> f32;

    /// Sample a `width` x `height` grid in row-major order (`y * width + x`).
    fn generate_field(&self, width: u32, height: u32, cell_size: f32) -> Vec<f32> {
        let mut field = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                field.push(self.sample(x as f32 * cell_size, y as f32 * cell_size));
            }
        }
        field
    }
}

impl<N: NoiseSource + ?Sized> NoiseSource for Box<N> {
    fn sample(&self, x: f32, y: f32) -> f32 {
        (**self).sample(x, y)
    }
}

/// Seeded permutation of `0..=255`, stored twice for branch-free wraparound.
#[derive(Clone)]
struct PermutationTable {
    perm: [u8; PERM_SIZE * 2],
}

impl PermutationTable {
    fn from_seed(seed: u64) -> Self {
        let mut base: Vec<u8> = (0..=255).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        base.shuffle(&mut rng);

        let mut perm = [0_u8; PERM_SIZE * 2];
        perm[..PERM_SIZE].copy_from_slice(&base);
        perm[PERM_SIZE..].copy_from_slice(&base);
        Self { perm }
    }

    #[inline]
    fn get(&self, index: usize) -> usize {
        usize::from(self.perm[index])
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("head", &&self.perm[..8])
            .finish_non_exhaustive()
    }
}

/// Wrap a lattice coordinate into the permutation table.
#[inline]
fn lattice_index(v: f32) -> usize {
    (v as i32 & 0xFF) as usize
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3` (C2 continuous at cell edges).
#[inline]
fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f32, a: f32, b: f32) -> f32 {
    a + t * (b - a)
}

/// Classic 2D Perlin gradient noise.
///
/// Output is approximately in [-1, 1]; a mild overshoot is possible.
///
/// # Example
///
/// ```
/// use stormscape_core::core_types::noise::{NoiseSource, PerlinNoise};
///
/// let a = PerlinNoise::new(42);
/// let b = PerlinNoise::new(42);
/// assert_eq!(a.sample(3.7, 1.2).to_bits(), b.sample(3.7, 1.2).to_bits());
/// ```
#[derive(Clone, Debug)]
pub struct PerlinNoise {
    seed: u64,
    perm: PermutationTable,
}

impl PerlinNoise {
    /// Create a generator whose permutation table is derived from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            perm: PermutationTable::from_seed(seed),
        }
    }

    /// Seed the permutation table was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn gradient(hash: usize, x: f32, y: f32) -> f32 {
        let (gx, gy) = GRADIENTS_2D[hash & 7];
        gx * x + gy * y
    }
}

impl NoiseSource for PerlinNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let x_floor = x.floor();
        let y_floor = y.floor();
        let xi = lattice_index(x_floor);
        let yi = lattice_index(y_floor);

        // Position within the cell, [0, 1)
        let xf = x - x_floor;
        let yf = y - y_floor;

        let u = fade(xf);
        let v = fade(yf);

        let p = &self.perm;
        let aa = p.get(p.get(xi) + yi);
        let ab = p.get(p.get(xi) + yi + 1);
        let ba = p.get(p.get(xi + 1) + yi);
        let bb = p.get(p.get(xi + 1) + yi + 1);

        let x1 = lerp(
            u,
            Self::gradient(aa, xf, yf),
            Self::gradient(ba, xf - 1.0, yf),
        );
        let x2 = lerp(
            u,
            Self::gradient(ab, xf, yf - 1.0),
            Self::gradient(bb, xf - 1.0, yf - 1.0),
        );

        lerp(v, x1, x2)
    }
}

/// 2D simplex noise.
///
/// Sums the contributions of the three corners of the enclosing triangle.
/// Fewer directional artifacts than [`PerlinNoise`] at a similar cost.
#[derive(Clone, Debug)]
pub struct SimplexNoise {
    seed: u64,
    perm: PermutationTable,
    perm_mod12: Vec<u8>,
}

impl SimplexNoise {
    /// Create a generator whose permutation table is derived from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let perm = PermutationTable::from_seed(seed);
        let perm_mod12 = perm.perm.iter().map(|p| p % 12).collect();
        Self {
            seed,
            perm,
            perm_mod12,
        }
    }

    /// Seed the permutation table was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Contribution of one corner at offset `(dx, dy)` with gradient index `gi`.
    #[inline]
    fn corner(gi: usize, dx: f32, dy: f32) -> f32 {
        let t = 0.5 - dx * dx - dy * dy;
        if t > 0.0 {
            let t2 = t * t;
            let (gx, gy) = GRADIENTS_SIMPLEX[gi];
            t2 * t2 * (gx * dx + gy * dy)
        } else {
            0.0
        }
    }
}

impl NoiseSource for SimplexNoise {
    fn sample(&self, x: f32, y: f32) -> f32 {
        // Skew the input to find the simplex cell
        let s = (x + y) * SKEW_2D;
        let i = (x + s).floor();
        let j = (y + s).floor();

        // Unskew the cell origin back to (x, y) space
        let t = (i + j) * UNSKEW_2D;
        let x0 = x - (i - t);
        let y0 = y - (j - t);

        // Lower or upper triangle
        let (i1, j1) = if x0 > y0 { (1, 0) } else { (0, 1) };

        let x1 = x0 - i1 as f32 + UNSKEW_2D;
        let y1 = y0 - j1 as f32 + UNSKEW_2D;
        let x2 = x0 - 1.0 + 2.0 * UNSKEW_2D;
        let y2 = y0 - 1.0 + 2.0 * UNSKEW_2D;

        let ii = lattice_index(i);
        let jj = lattice_index(j);
        let p = &self.perm;
        let gi0 = usize::from(self.perm_mod12[ii + p.get(jj)]);
        let gi1 = usize::from(self.perm_mod12[ii + i1 + p.get(jj + j1)]);
        let gi2 = usize::from(self.perm_mod12[ii + 1 + p.get(jj + 1)]);

        let n0 = Self::corner(gi0, x0, y0);
        let n1 = Self::corner(gi1, x1, y1);
        let n2 = Self::corner(gi2, x2, y2);

        SIMPLEX_SCALE * (n0 + n1 + n2)
    }
}

/// Parameters for fractal noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Seed for the base generator.
    pub seed: u64,
    /// Number of noise layers summed per sample.
    pub octaves: u32,
    /// Amplitude multiplier per octave (0.5 typical).
    pub persistence: f32,
    /// Frequency multiplier per octave (2.0 typical).
    pub lacunarity: f32,
    /// Base frequency applied to input coordinates.
    pub scale: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            scale: 1.0,
        }
    }
}

impl NoiseConfig {
    /// Default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Same configuration with a different octave count.
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Same configuration with a different base frequency.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }
}

/// Fractal Brownian motion over a base generator.
///
/// ```text
/// fbm(x) = sum_i persistence^i * noise(x * scale * lacunarity^i) / sum_i persistence^i
/// ```
///
/// Each added octave contributes finer detail, so more octaves raise the
/// local high-frequency variance of the field.
#[derive(Clone, Debug)]
pub struct FractalNoise<N = PerlinNoise> {
    base: N,
    config: NoiseConfig,
}

impl FractalNoise<PerlinNoise> {
    /// Fractal noise over a Perlin base seeded from `config.seed`.
    #[must_use]
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            base: PerlinNoise::new(config.seed),
            config,
        }
    }
}

impl Default for FractalNoise<PerlinNoise> {
    fn default() -> Self {
        Self::new(NoiseConfig::default())
    }
}

impl<N: NoiseSource> FractalNoise<N> {
    /// Fractal noise over an existing generator. `config.seed` is ignored.
    pub fn with_base(base: N, config: NoiseConfig) -> Self {
        Self { base, config }
    }

    pub fn config(&self) -> &NoiseConfig {
        &self.config
    }

    pub fn base(&self) -> &N {
        &self.base
    }

    /// Sample with explicit octave parameters instead of the stored config.
    ///
    /// Zero octaves yields 0.0.
    pub fn sample_with(
        &self,
        x: f32,
        y: f32,
        octaves: u32,
        persistence: f32,
        lacunarity: f32,
    ) -> f32 {
        let mut total = 0.0_f32;
        let mut frequency = 1.0_f32;
        let mut amplitude = 1.0_f32;
        let mut amplitude_sum = 0.0_f32;

        for _ in 0..octaves {
            let fx = x * frequency * self.config.scale;
            let fy = y * frequency * self.config.scale;
            total += self.base.sample(fx, fy) * amplitude;

            amplitude_sum += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        if amplitude_sum > 0.0 {
            total / amplitude_sum
        } else {
            0.0
        }
    }

    /// Sample with the stored octave count but a caller-chosen override.
    ///
    /// Used by adaptive quality to trim octaves without rebuilding the generator.
    pub fn sample_octaves(&self, x: f32, y: f32, octaves: u32) -> f32 {
        self.sample_with(
            x,
            y,
            octaves,
            self.config.persistence,
            self.config.lacunarity,
        )
    }
}

impl<N: NoiseSource> NoiseSource for FractalNoise<N> {
    fn sample(&self, x: f32, y: f32) -> f32 {
        self.sample_octaves(x, y, self.config.octaves)
    }
}

/// Domain-warped noise.
///
/// Computes coordinate offsets from the unwarped point, refines them from the
/// first-pass warped point, then samples at the doubly displaced position:
///
/// ```text
/// w1 = (n(p), n(p + (5.2, 1.3))) * s
/// w2 = (n(p + w1), n(p + w1 + (1.7, 9.2))) * s / 2
/// warp(p) = n(p + w1 + w2)
/// ```
#[derive(Clone, Debug)]
pub struct DomainWarp<N = FractalNoise> {
    noise: N,
    warp_strength: f32,
}

impl Default for DomainWarp<FractalNoise> {
    fn default() -> Self {
        Self::new(FractalNoise::default(), 4.0)
    }
}

impl<N: NoiseSource> DomainWarp<N> {
    pub fn new(noise: N, warp_strength: f32) -> Self {
        Self {
            noise,
            warp_strength,
        }
    }

    pub fn warp_strength(&self) -> f32 {
        self.warp_strength
    }
}

impl<N: NoiseSource> NoiseSource for DomainWarp<N> {
    fn sample(&self, x: f32, y: f32) -> f32 {
        let s = self.warp_strength;

        let wx = self.noise.sample(x, y) * s;
        let wy = self.noise.sample(x + 5.2, y + 1.3) * s;

        let wx2 = self.noise.sample(x + wx, y + wy) * s * 0.5;
        let wy2 = self.noise.sample(x + wx + 1.7, y + wy + 9.2) * s * 0.5;

        self.noise.sample(x + wx + wx2, y + wy + wy2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> impl Iterator<Item = (f32, f32)> {
        (0..40).flat_map(|i| (0..40).map(move |j| (i as f32 * 0.173 - 3.0, j as f32 * 0.219 - 4.0)))
    }

    /// Energy of second differences along a line; a proxy for fine detail.
    fn curvature_energy(samples: &[f32]) -> f32 {
        samples
            .windows(3)
            .map(|w| {
                let d2 = w[2] - 2.0 * w[1] + w[0];
                d2 * d2
            })
            .sum()
    }

    #[test]
    fn perlin_is_bit_identical_for_same_seed() {
        let a = PerlinNoise::new(42);
        let b = PerlinNoise::new(42);
        for (x, y) in grid_points() {
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn simplex_is_bit_identical_for_same_seed() {
        let a = SimplexNoise::new(7);
        let b = SimplexNoise::new(7);
        for (x, y) in grid_points() {
            assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
        }
    }

    #[test]
    fn perlin_and_simplex_stay_bounded() {
        let perlin = PerlinNoise::new(1);
        let simplex = SimplexNoise::new(1);
        for i in 0..200 {
            for j in 0..200 {
                let x = i as f32 * 0.07;
                let y = j as f32 * 0.09;
                let p = perlin.sample(x, y);
                let s = simplex.sample(x, y);
                assert!((-1.5..=1.5).contains(&p), "perlin out of range: {p}");
                assert!((-1.5..=1.5).contains(&s), "simplex out of range: {s}");
            }
        }
    }

    #[test]
    fn perlin_vanishes_on_lattice_points() {
        let perlin = PerlinNoise::new(99);
        for i in -5..5 {
            assert_eq!(perlin.sample(i as f32, (i * 3) as f32), 0.0);
        }
    }

    #[test]
    fn nearby_samples_are_close() {
        let perlin = PerlinNoise::new(42);
        let simplex = SimplexNoise::new(42);
        let fractal = FractalNoise::new(NoiseConfig::with_seed(42));
        for (x, y) in grid_points() {
            assert!((perlin.sample(x, y) - perlin.sample(x + 0.01, y)).abs() < 0.1);
            assert!((simplex.sample(x, y) - simplex.sample(x + 0.01, y)).abs() < 0.1);
            assert!((fractal.sample(x, y) - fractal.sample(x + 0.01, y)).abs() < 0.1);
        }
    }

    #[test]
    fn different_seeds_differ() {
        let a = PerlinNoise::new(1);
        let b = PerlinNoise::new(2);
        let differing = grid_points()
            .filter(|&(x, y)| a.sample(x, y) != b.sample(x, y))
            .count();
        assert!(differing > 100, "only {differing} samples differ");

        let sa = SimplexNoise::new(1);
        let sb = SimplexNoise::new(2);
        assert!(grid_points().any(|(x, y)| sa.sample(x, y) != sb.sample(x, y)));
    }

    #[test]
    fn more_octaves_add_local_variance() {
        let fractal = FractalNoise::new(NoiseConfig::with_seed(42));
        let xs: Vec<f32> = (0..400).map(|i| i as f32 * 0.05 + 0.13).collect();

        let one: Vec<f32> = xs.iter().map(|&x| fractal.sample_with(x, 0.37, 1, 0.5, 2.0)).collect();
        let four: Vec<f32> = xs.iter().map(|&x| fractal.sample_with(x, 0.37, 4, 0.5, 2.0)).collect();

        let e1 = curvature_energy(&one);
        let e4 = curvature_energy(&four);
        assert!(e4 > e1, "4 octaves ({e4}) should be rougher than 1 ({e1})");
    }

    #[test]
    fn zero_octaves_is_flat() {
        let fractal = FractalNoise::new(NoiseConfig::default().with_octaves(0));
        for (x, y) in grid_points().take(20) {
            assert_eq!(fractal.sample(x, y), 0.0);
        }
    }

    #[test]
    fn fractal_single_octave_matches_base() {
        let fractal = FractalNoise::new(NoiseConfig::with_seed(5).with_octaves(1));
        let base = PerlinNoise::new(5);
        for (x, y) in grid_points().take(50) {
            assert_eq!(fractal.sample(x, y), base.sample(x, y));
        }
    }

    #[test]
    fn domain_warp_is_deterministic_and_distorts() {
        let a = DomainWarp::default();
        let b = DomainWarp::default();
        let plain = FractalNoise::default();

        let mut moved = 0;
        for (x, y) in grid_points().take(200) {
            let v = a.sample(x, y);
            assert_eq!(v.to_bits(), b.sample(x, y).to_bits());
            if (v - plain.sample(x, y)).abs() > 1e-4 {
                moved += 1;
            }
        }
        assert!(moved > 50, "warp barely changed the field ({moved} samples)");
    }

    #[test]
    fn generated_field_matches_samples() {
        let noise = SimplexNoise::new(54321);
        let field = noise.generate_field(10, 8, 0.3);
        assert_eq!(field.len(), 80);
        for y in 0..8_u32 {
            for x in 0..10_u32 {
                let expected = noise.sample(x as f32 * 0.3, y as f32 * 0.3);
                assert_eq!(field[(y * 10 + x) as usize], expected);
            }
        }
    }

    #[test]
    fn boxed_sources_compose() {
        let boxed: Box<dyn NoiseSource> = Box::new(PerlinNoise::new(3));
        let fractal = FractalNoise::with_base(boxed, NoiseConfig::default().with_octaves(2));
        let v = fractal.sample(0.4, 0.6);
        assert!(v.is_finite());
    }
}
