//! Branching lightning bolts.
//!
//! A bolt is a list of integer line segments generated once from a seeded
//! RNG. The main channel zig-zags downward to a target row; after each step
//! it may fork a short side branch. Bolts fade over a few frames and are
//! rasterized with Bresenham's line algorithm.

use crate::render::{ColorId, RenderLayer, RenderQueue};
use rand::seq::IndexedRandom;
use rand::Rng;

/// Chance of a side branch after each main-channel step.
const BRANCH_PROBABILITY: f64 = 0.3;
/// Chance a side branch stops after each of its steps.
const BRANCH_STOP_PROBABILITY: f64 = 0.1;

/// One straight piece of a bolt, in screen cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightningSegment {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
    /// Part of a side branch rather than the main channel.
    pub branch: bool,
}

/// A fading, branching lightning strike.
#[derive(Debug, Clone)]
pub struct LightningBolt {
    segments: Vec<LightningSegment>,
    lifetime: u32,
    age: u32,
}

impl LightningBolt {
    /// Generate a bolt from `(start_x, start_y)` down to at least `end_y`.
    pub fn generate<R: Rng>(rng: &mut R, start_x: i32, start_y: i32, end_y: i32) -> Self {
        let lifetime = rng.random_range(3..=8);
        let mut segments = Vec::new();

        let (mut x, mut y) = (start_x, start_y);
        while y < end_y {
            let next_x = x + rng.random_range(-3..=3);
            let next_y = y + rng.random_range(2..=5);
            segments.push(LightningSegment {
                x1: x,
                y1: y,
                x2: next_x,
                y2: next_y,
                branch: false,
            });

            if rng.random_bool(BRANCH_PROBABILITY) {
                let length = rng.random_range(3..=8);
                Self::grow_branch(rng, &mut segments, next_x, next_y, length);
            }

            x = next_x;
            y = next_y;
        }

        Self {
            segments,
            lifetime,
            age: 0,
        }
    }

    fn grow_branch<R: Rng>(
        rng: &mut R,
        segments: &mut Vec<LightningSegment>,
        x: i32,
        y: i32,
        length: u32,
    ) {
        let direction = *[-1, 1].choose(rng).unwrap_or(&1);
        let (mut x, mut y) = (x, y);
        for _ in 0..length {
            let next_x = x + rng.random_range(1..=3) * direction;
            let next_y = y + rng.random_range(1..=3);
            segments.push(LightningSegment {
                x1: x,
                y1: y,
                x2: next_x,
                y2: next_y,
                branch: true,
            });
            x = next_x;
            y = next_y;

            if rng.random_bool(BRANCH_STOP_PROBABILITY) {
                break;
            }
        }
    }

    pub fn segments(&self) -> &[LightningSegment] {
        &self.segments
    }

    pub fn main_channel(&self) -> impl Iterator<Item = &LightningSegment> {
        self.segments.iter().filter(|s| !s.branch)
    }

    pub fn lifetime(&self) -> u32 {
        self.lifetime
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    /// Age by one frame.
    pub fn update(&mut self) {
        self.age += 1;
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }

    /// `max(0, 1 - age/lifetime)`.
    pub fn brightness(&self) -> f32 {
        if self.lifetime == 0 {
            return 0.0;
        }
        (1.0 - self.age as f32 / self.lifetime as f32).max(0.0)
    }

    /// Glyph and color for the current brightness; `None` once dark.
    pub fn appearance(&self) -> Option<(char, ColorId)> {
        let b = self.brightness();
        if b <= 0.0 {
            None
        } else if b > 0.7 {
            Some(('█', ColorId::WHITE))
        } else if b > 0.4 {
            Some(('▓', ColorId::YELLOW))
        } else {
            Some(('│', ColorId::BLUE))
        }
    }

    /// Rasterize every segment into the effects layer. Returns cells queued.
    pub fn render(&self, queue: &mut RenderQueue) -> usize {
        let Some((glyph, color)) = self.appearance() else {
            return 0;
        };
        let mut queued = 0;
        for s in &self.segments {
            for (x, y) in bresenham(s.x1, s.y1, s.x2, s.y2) {
                queue.add(x, y, glyph, color, RenderLayer::Effects);
                queued += 1;
            }
        }
        queued
    }
}

/// Integer cells on the line from `(x1, y1)` to `(x2, y2)`, both ends included.
pub fn bresenham(x1: i32, y1: i32, x2: i32, y2: i32) -> Vec<(i32, i32)> {
    let dx = (x2 - x1).abs();
    let dy = (y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x1, y1);

    let mut cells = Vec::with_capacity((dx.max(dy) + 1) as usize);
    loop {
        cells.push((x, y));
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn main_channel_connects_origin_to_target() {
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let bolt = LightningBolt::generate(&mut rng, 40, 2, 20);
            let main: Vec<_> = bolt.main_channel().copied().collect();
            assert_eq!((main[0].x1, main[0].y1), (40, 2));
            for pair in main.windows(2) {
                assert_eq!((pair[0].x2, pair[0].y2), (pair[1].x1, pair[1].y1));
            }
            let last = main[main.len() - 1];
            assert!(last.y2 >= 20);
            assert!(last.y1 < 20);
            assert!((3..=8).contains(&bolt.lifetime()));
        }
    }

    #[test]
    fn steps_stay_in_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let bolt = LightningBolt::generate(&mut rng, 0, 0, 200);
        for s in bolt.segments() {
            let (dx, dy) = (s.x2 - s.x1, s.y2 - s.y1);
            if s.branch {
                assert!((1..=3).contains(&dx.abs()) && (1..=3).contains(&dy));
            } else {
                assert!((-3..=3).contains(&dx) && (2..=5).contains(&dy));
            }
        }
        assert!(bolt.segments().iter().any(|s| s.branch));
    }

    #[test]
    fn same_seed_same_bolt() {
        let a = LightningBolt::generate(&mut ChaCha8Rng::seed_from_u64(8), 10, 1, 30);
        let b = LightningBolt::generate(&mut ChaCha8Rng::seed_from_u64(8), 10, 1, 30);
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn start_at_or_below_target_is_empty() {
        let bolt = LightningBolt::generate(&mut ChaCha8Rng::seed_from_u64(0), 10, 30, 30);
        assert!(bolt.segments().is_empty());
    }

    #[test]
    fn fades_then_expires() {
        let mut bolt = LightningBolt::generate(&mut ChaCha8Rng::seed_from_u64(2), 10, 0, 10);
        assert_eq!(bolt.brightness(), 1.0);
        assert_eq!(bolt.appearance().map(|a| a.0), Some('█'));
        let mut last = bolt.brightness();
        while !bolt.is_expired() {
            bolt.update();
            assert!(bolt.brightness() < last);
            last = bolt.brightness();
        }
        assert_eq!(bolt.brightness(), 0.0);
        assert_eq!(bolt.appearance(), None);
        assert_eq!(bolt.render(&mut RenderQueue::new()), 0);
    }

    #[test]
    fn bresenham_covers_endpoints() {
        let cells = bresenham(0, 0, 5, 2);
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(5, 2)));
        assert_eq!(cells.len(), 6);
        assert_eq!(bresenham(3, 3, 3, 3), vec![(3, 3)]);
        assert_eq!(bresenham(2, 0, 2, 4).len(), 5);
    }

    #[test]
    fn render_uses_effects_layer() {
        let bolt = LightningBolt::generate(&mut ChaCha8Rng::seed_from_u64(4), 10, 0, 12);
        let mut queue = RenderQueue::new();
        assert!(bolt.render(&mut queue) > 0);
        assert!(queue
            .get_sorted()
            .iter()
            .all(|c| c.layer == RenderLayer::Effects && c.glyph == '█'));
    }
}
