//! Rolling render statistics and the performance report.

use crate::render::queue::RenderLayer;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Default number of frames kept in each rolling window.
pub const DEFAULT_WINDOW: usize = 60;

/// Rolling windows of frame times, particle counts, and per-layer times.
#[derive(Debug, Clone)]
pub struct RenderStats {
    window: usize,
    frame_budget_ms: f64,
    frame_times: VecDeque<f64>,
    particle_counts: VecDeque<usize>,
    layer_times: FxHashMap<RenderLayer, VecDeque<f64>>,
    total_frames: u64,
    dropped_frames: u64,
    peak_particles: usize,
}

impl RenderStats {
    /// `window` is clamped to at least 1.
    pub fn new(window: usize, frame_budget_ms: f64) -> Self {
        let window = window.max(1);
        Self {
            window,
            frame_budget_ms,
            frame_times: VecDeque::with_capacity(window),
            particle_counts: VecDeque::with_capacity(window),
            layer_times: FxHashMap::default(),
            total_frames: 0,
            dropped_frames: 0,
            peak_particles: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn push_bounded<T>(queue: &mut VecDeque<T>, value: T, window: usize) {
        if queue.len() == window {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    /// Record a finished frame. Frames over budget count as dropped.
    pub fn record_frame(&mut self, frame_ms: f64, particle_count: usize) {
        Self::push_bounded(&mut self.frame_times, frame_ms, self.window);
        Self::push_bounded(&mut self.particle_counts, particle_count, self.window);
        self.total_frames += 1;
        if frame_ms > self.frame_budget_ms {
            self.dropped_frames += 1;
        }
        self.peak_particles = self.peak_particles.max(particle_count);
    }

    pub fn record_layer(&mut self, layer: RenderLayer, ms: f64) {
        let window = self.window;
        let times = self
            .layer_times
            .entry(layer)
            .or_insert_with(|| VecDeque::with_capacity(window));
        Self::push_bounded(times, ms, window);
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn dropped_frames(&self) -> u64 {
        self.dropped_frames
    }

    pub fn avg_frame_ms(&self) -> f64 {
        mean(self.frame_times.iter().copied())
    }

    /// Frames per second from the windowed average; 0 with no frames.
    pub fn fps(&self) -> f64 {
        let avg = self.avg_frame_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// 95th-percentile frame time; 0 with fewer than two frames.
    pub fn p95_frame_ms(&self) -> f64 {
        let n = self.frame_times.len();
        if n < 2 {
            return 0.0;
        }
        let mut sorted: Vec<f64> = self.frame_times.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);
        sorted[(n as f64 * 0.95) as usize]
    }

    pub fn avg_particles(&self) -> f64 {
        mean(self.particle_counts.iter().map(|&c| c as f64))
    }

    pub fn avg_layer_ms(&self, layer: RenderLayer) -> f64 {
        self.layer_times
            .get(&layer)
            .map_or(0.0, |t| mean(t.iter().copied()))
    }

    pub fn report(&self, quality_level: f32) -> PerformanceReport {
        let layers = self
            .layer_times
            .keys()
            .map(|&layer| (layer.name().to_string(), self.avg_layer_ms(layer)))
            .collect();
        PerformanceReport {
            fps: self.fps(),
            avg_ms: self.avg_frame_ms(),
            p95_ms: self.p95_frame_ms(),
            total_frames: self.total_frames,
            dropped_frames: self.dropped_frames,
            avg_particles: self.avg_particles(),
            peak_particles: self.peak_particles,
            layers,
            quality_level,
        }
    }
}

impl Default for RenderStats {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, 1000.0 / 30.0)
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Snapshot of engine performance for a debug overlay or logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub fps: f64,
    pub avg_ms: f64,
    pub p95_ms: f64,
    pub total_frames: u64,
    pub dropped_frames: u64,
    pub avg_particles: f64,
    pub peak_particles: usize,
    /// Average milliseconds per layer, keyed by layer name.
    pub layers: BTreeMap<String, f64>,
    pub quality_level: f32,
}

impl PerformanceReport {
    /// Short human-readable lines, one fact each.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("FPS {:.1}  avg {:.2}ms  p95 {:.2}ms", self.fps, self.avg_ms, self.p95_ms),
            format!(
                "frames {}  dropped {}  particles {:.0} (peak {})",
                self.total_frames, self.dropped_frames, self.avg_particles, self.peak_particles
            ),
            format!("quality {:.2}", self.quality_level),
        ];
        lines.extend(
            self.layers
                .iter()
                .map(|(name, ms)| format!("{name} {ms:.3}ms")),
        );
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_stats_are_zero() {
        let stats = RenderStats::default();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.avg_frame_ms(), 0.0);
        assert_eq!(stats.p95_frame_ms(), 0.0);
    }

    #[test]
    fn sixty_fps_frames() {
        let mut stats = RenderStats::new(60, 1000.0 / 60.0);
        for _ in 0..60 {
            stats.record_frame(16.67, 10);
        }
        let fps = stats.fps();
        assert!(fps > 55.0 && fps < 65.0, "fps = {fps}");
        assert_relative_eq!(stats.avg_particles(), 10.0);
    }

    #[test]
    fn window_is_bounded() {
        let mut stats = RenderStats::new(3, 100.0);
        for ms in [100.0, 200.0, 10.0, 20.0, 30.0] {
            stats.record_frame(ms, 0);
        }
        assert_relative_eq!(stats.avg_frame_ms(), 20.0);
        assert_eq!(stats.total_frames(), 5);
        assert_eq!(stats.dropped_frames(), 1);
    }

    #[test]
    fn p95_picks_the_tail() {
        let mut stats = RenderStats::new(100, 1000.0);
        for i in 1..=100 {
            stats.record_frame(f64::from(i), 0);
        }
        assert_eq!(stats.p95_frame_ms(), 96.0);

        let mut two = RenderStats::new(10, 1000.0);
        two.record_frame(1.0, 0);
        assert_eq!(two.p95_frame_ms(), 0.0);
        two.record_frame(9.0, 0);
        assert_eq!(two.p95_frame_ms(), 9.0);
    }

    #[test]
    fn report_includes_layers() {
        let mut stats = RenderStats::new(10, 16.0);
        stats.record_layer(RenderLayer::Clouds, 1.0);
        stats.record_layer(RenderLayer::Clouds, 3.0);
        stats.record_frame(8.0, 42);
        let report = stats.report(0.8);
        assert_relative_eq!(report.layers["clouds"], 2.0);
        assert_eq!(report.peak_particles, 42);
        assert_eq!(report.quality_level, 0.8);
        assert!(report.lines().iter().any(|l| l.starts_with("clouds")));

        let json = serde_json::to_string(&report).unwrap();
        let back: PerformanceReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
