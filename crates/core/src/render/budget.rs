//! Frame-time budget and adaptive quality control.
//!
//! Each frame has `1000 / target_fps` milliseconds, split among named phases
//! by fixed ratios. After a frame ends, its duration feeds a hysteresis loop:
//!
//! ```text
//! frame > 1.2 × budget  →  overruns += 1; if overruns > 5: quality -= 0.1 (≥ floor), overruns = 0
//! frame < 0.7 × budget  →  quality += 0.02 (≤ 1.0), overruns -= 1 (≥ 0)
//! otherwise             →  unchanged
//! ```
//!
//! An overrun never aborts a frame; it only lowers quality for later frames.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

/// Frames slower than this multiple of the budget count as overruns.
const OVERRUN_FACTOR: f64 = 1.2;
/// Frames faster than this multiple of the budget earn quality back.
const HEADROOM_FACTOR: f64 = 0.7;
/// Overruns tolerated before quality drops.
const OVERRUN_LIMIT: u32 = 5;
const QUALITY_STEP_DOWN: f32 = 0.1;
const QUALITY_STEP_UP: f32 = 0.02;
/// Share of the frame given to phases without a configured ratio.
const UNKNOWN_PHASE_RATIO: f32 = 0.10;
/// Frame rate used when the configured one is unusable.
pub const FALLBACK_FPS: f32 = 30.0;

/// Fraction of the frame budget allotted to each phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseBudgets {
    pub physics: f32,
    pub render: f32,
    pub particles: f32,
    pub misc: f32,
}

impl Default for PhaseBudgets {
    fn default() -> Self {
        Self {
            physics: 0.30,
            render: 0.50,
            particles: 0.15,
            misc: 0.05,
        }
    }
}

impl PhaseBudgets {
    /// Ratio for a phase name; unknown names get 10 %.
    pub fn ratio(&self, phase: &str) -> f32 {
        match phase {
            "physics" => self.physics,
            "render" => self.render,
            "particles" => self.particles,
            "misc" => self.misc,
            _ => UNKNOWN_PHASE_RATIO,
        }
    }

    pub fn total(&self) -> f32 {
        self.physics + self.render + self.particles + self.misc
    }

    pub fn entries(&self) -> [(&'static str, f32); 4] {
        [
            ("physics", self.physics),
            ("render", self.render),
            ("particles", self.particles),
            ("misc", self.misc),
        ]
    }
}

/// Per-frame timing and the quality control loop.
#[derive(Debug, Clone)]
pub struct FrameBudget {
    target_fps: f32,
    frame_budget_ms: f64,
    phase_budgets: PhaseBudgets,
    quality_floor: f32,
    quality_level: f32,
    overruns: u32,
    frame_start: Option<Instant>,
    phase_starts: FxHashMap<String, Instant>,
    phase_times: FxHashMap<String, f64>,
    last_frame_ms: f64,
}

impl FrameBudget {
    /// Budget for `target_fps` with default phase ratios and a 0.3 quality floor.
    pub fn new(target_fps: f32) -> Self {
        Self::with_settings(target_fps, PhaseBudgets::default(), 0.3)
    }

    pub fn with_settings(target_fps: f32, phase_budgets: PhaseBudgets, quality_floor: f32) -> Self {
        let target_fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            warn!(
                "target_fps {} is not positive; using {}",
                target_fps, FALLBACK_FPS
            );
            FALLBACK_FPS
        };
        let quality_floor = if quality_floor > 0.0 && quality_floor <= 1.0 {
            quality_floor
        } else {
            let clamped = quality_floor.clamp(0.01, 1.0);
            warn!(
                "quality_floor {} outside (0, 1]; using {}",
                quality_floor, clamped
            );
            clamped
        };

        Self {
            target_fps,
            frame_budget_ms: 1000.0 / f64::from(target_fps),
            phase_budgets,
            quality_floor,
            quality_level: 1.0,
            overruns: 0,
            frame_start: None,
            phase_starts: FxHashMap::default(),
            phase_times: FxHashMap::default(),
            last_frame_ms: 0.0,
        }
    }

    pub fn target_fps(&self) -> f32 {
        self.target_fps
    }

    pub fn frame_budget_ms(&self) -> f64 {
        self.frame_budget_ms
    }

    pub fn quality_level(&self) -> f32 {
        self.quality_level
    }

    pub fn quality_floor(&self) -> f32 {
        self.quality_floor
    }

    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    pub fn last_frame_ms(&self) -> f64 {
        self.last_frame_ms
    }

    /// Start timing a frame and forget the previous frame's phases.
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
        self.phase_starts.clear();
        self.phase_times.clear();
    }

    pub fn begin_phase(&mut self, name: &str) {
        self.phase_starts.insert(name.to_string(), Instant::now());
    }

    /// Stop timing `name` and add the elapsed time to it. Returns milliseconds.
    ///
    /// A phase that was never begun records nothing and returns 0.
    pub fn end_phase(&mut self, name: &str) -> f64 {
        let Some(start) = self.phase_starts.remove(name) else {
            return 0.0;
        };
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        self.record_phase(name, ms);
        ms
    }

    /// Add an externally measured duration to a phase.
    pub fn record_phase(&mut self, name: &str, ms: f64) {
        *self.phase_times.entry(name.to_string()).or_insert(0.0) += ms.max(0.0);
    }

    pub fn phase_time_ms(&self, name: &str) -> f64 {
        self.phase_times.get(name).copied().unwrap_or(0.0)
    }

    /// Time allotted to a phase at the current quality level.
    pub fn phase_budget_ms(&self, name: &str) -> f64 {
        self.frame_budget_ms
            * f64::from(self.phase_budgets.ratio(name))
            * f64::from(self.quality_level)
    }

    /// Milliseconds since `begin_frame`, or 0 outside a frame.
    pub fn elapsed_ms(&self) -> f64 {
        self.frame_start
            .map_or(0.0, |start| start.elapsed().as_secs_f64() * 1000.0)
    }

    pub fn time_remaining_ms(&self) -> f64 {
        (self.frame_budget_ms - self.elapsed_ms()).max(0.0)
    }

    pub fn is_over_budget(&self) -> bool {
        self.elapsed_ms() > self.frame_budget_ms
    }

    /// Close the frame, adjust quality, and return its duration in milliseconds.
    ///
    /// The duration is the larger of wall time since `begin_frame` and the sum
    /// of recorded phase times.
    pub fn end_frame(&mut self) -> f64 {
        let recorded: f64 = self.phase_times.values().sum();
        let frame_ms = self.elapsed_ms().max(recorded);
        self.frame_start = None;
        self.last_frame_ms = frame_ms;
        self.adjust_quality(frame_ms);
        frame_ms
    }

    /// Feed one frame duration into the hysteresis loop.
    pub fn adjust_quality(&mut self, frame_ms: f64) {
        if frame_ms > self.frame_budget_ms * OVERRUN_FACTOR {
            self.overruns += 1;
            if self.overruns > OVERRUN_LIMIT {
                let previous = self.quality_level;
                self.quality_level = (self.quality_level - QUALITY_STEP_DOWN).max(self.quality_floor);
                self.overruns = 0;
                debug!(
                    "Sustained overrun ({:.2}ms vs {:.2}ms budget): quality {:.2} -> {:.2}",
                    frame_ms, self.frame_budget_ms, previous, self.quality_level
                );
            }
        } else if frame_ms < self.frame_budget_ms * HEADROOM_FACTOR {
            self.quality_level = (self.quality_level + QUALITY_STEP_UP).min(1.0);
            self.overruns = self.overruns.saturating_sub(1);
        }
    }
}

impl Default for FrameBudget {
    fn default() -> Self {
        Self::new(30.0)
    }
}
