//! Frame orchestration for a weather scene.
//!
//! A [`WeatherScene`] owns every piece of per-scene state and runs one frame
//! as a fixed sequence:
//!
//! 1. start the frame budget and clear the render queue
//! 2. spawn precipitation (count scaled by quality)
//! 3. step gusts, particles, and lightning
//! 4. queue clouds, precipitation, effects, and the optional debug overlay,
//!    timing each layer into the render stats
//! 5. draw the queue onto the surface
//! 6. close the budget (adjusting quality) and record the frame
//!
//! Every random choice comes from one generator seeded by
//! [`EngineConfig::seed`], so two scenes with the same seed, weather, and size
//! draw identical frames.

use crate::config::EngineConfig;
use crate::core_types::vec2::Vec2;
use crate::physics::{
    Bounds, DragForce, GravityForce, Particle, ParticleSystem, TurbulenceField, WindForce,
};
use crate::render::{
    ColorId, DrawSurface, FrameBudget, PerformanceReport, ProfilerScope, RenderCommand,
    RenderLayer, RenderQueue, RenderStats, TextAttributes,
};
use crate::weather::{
    AtmosphericModel, CloudLayer, LightningBolt, PrecipitationProfile, WeatherReading, WindModel,
};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Physics step per frame, in frames. Velocities are cells per frame.
const FRAME_DT: f32 = 1.0;
/// Row new precipitation appears on.
const SPAWN_ROW: f32 = 2.0;
/// Wind speed (m/s) to screen drift (cells per frame).
const WIND_CELLS_PER_MS: f32 = 0.1;
/// Share of the wind a new particle starts with.
const SPAWN_WIND_SHARE: f32 = 0.5;
/// Turbulence field speed at full turbulence intensity.
const TURBULENCE_GAIN: f32 = 1.5;
/// Per-frame chance of a strike while no flash is active.
const LIGHTNING_PROBABILITY: f64 = 0.02;
/// Frames between strikes, counted from the strike.
const FLASH_FRAMES: u32 = 10;
/// The sky stays lit while the flash timer is above this.
const SKY_FLASH_ABOVE: u32 = 7;
/// Columns kept clear of strikes at each screen edge.
const STRIKE_EDGE_MARGIN: i32 = 10;

/// Seed offsets so each consumer gets its own stream.
const WIND_SEED_OFFSET: u64 = 1;
const TURBULENCE_SEED_OFFSET: u64 = 2;

/// What one call to [`WeatherScene::frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameSummary {
    pub frame: u64,
    pub frame_ms: f64,
    pub spawned: usize,
    pub particles: usize,
    pub cloud_cells: usize,
    pub lightning_cells: usize,
    pub commands: usize,
    pub drawn: usize,
    pub quality_level: f32,
    pub sky_flash: bool,
}

/// A weather reading turned into an animated, budgeted scene.
#[derive(Debug)]
pub struct WeatherScene {
    width: u16,
    height: u16,
    config: EngineConfig,
    reading: WeatherReading,
    profile: PrecipitationProfile,
    atmosphere: AtmosphericModel,
    particles: ParticleSystem,
    wind: WindModel,
    clouds: CloudLayer,
    bolts: Vec<LightningBolt>,
    flash_timer: u32,
    queue: RenderQueue,
    budget: FrameBudget,
    stats: RenderStats,
    rng: ChaCha8Rng,
    frame_count: u64,
}

impl WeatherScene {
    pub fn new(width: u16, height: u16, reading: WeatherReading, config: EngineConfig) -> Self {
        let seed = config.seed;
        let render = config.render;
        let budget =
            FrameBudget::with_settings(render.target_fps, render.phase_budgets, render.quality_floor);
        let stats = RenderStats::new(render.stats_window, budget.frame_budget_ms());
        let atmosphere = AtmosphericModel::new(reading.atmospheric_state());

        let mut scene = Self {
            width,
            height,
            config,
            reading,
            profile: reading.condition.profile(),
            atmosphere,
            particles: ParticleSystem::new(config.physics, Bounds::from_size(width, height)),
            wind: WindModel::new(
                reading.wind_speed_ms.max(0.0),
                reading.wind_direction_deg,
                seed.wrapping_add(WIND_SEED_OFFSET),
            ),
            clouds: CloudLayer::new(seed),
            bolts: Vec::new(),
            flash_timer: 0,
            queue: RenderQueue::new(),
            budget,
            stats,
            rng: ChaCha8Rng::seed_from_u64(seed),
            frame_count: 0,
        };
        scene.install_generators();

        info!(
            "Weather scene created: {}x{} cells, condition={}, seed={}, target {} fps",
            width,
            height,
            reading.condition,
            seed,
            scene.budget.target_fps()
        );
        scene
    }

    /// Replace the weather. Live particles keep falling under the new forces.
    pub fn set_weather(&mut self, reading: WeatherReading) {
        self.reading = reading;
        self.profile = reading.condition.profile();
        self.atmosphere = AtmosphericModel::new(reading.atmospheric_state());
        self.wind.base_speed = reading.wind_speed_ms.max(0.0);
        self.wind.base_direction_deg = reading.wind_direction_deg;
        if !self.profile.has_lightning {
            self.flash_timer = 0;
        }

        self.particles.clear_force_generators();
        self.install_generators();
        info!(
            "Weather changed to {} ({} particles kept)",
            reading.condition,
            self.particles.len()
        );
    }

    /// Change the canvas size. Particles outside the new bounds are culled on the next update.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.particles.set_bounds(Bounds::from_size(width, height));
        debug!("Scene resized to {}x{}", width, height);
    }

    fn install_generators(&mut self) {
        let physics = *self.particles.config();
        let gravity = physics.gravity * self.profile.gravity_scale;
        let drag = physics.air_resistance * self.profile.drag_scale;

        let base = self.base_wind();
        let mut wind = WindForce::new(base);
        if self.profile.turbulent {
            let strength =
                self.atmosphere.turbulence_intensity() * TURBULENCE_GAIN * physics.wind_strength;
            wind = wind.with_turbulence_field(TurbulenceField::new(
                self.config.seed.wrapping_add(TURBULENCE_SEED_OFFSET),
                strength,
            ));
        }

        self.particles
            .add_force_generator(Box::new(GravityForce::new(gravity)));
        self.particles.add_force_generator(Box::new(DragForce::new(drag)));
        self.particles.add_force_generator(Box::new(wind));

        debug!(
            "Force generators: gravity={:.3}, drag={:.4}, wind={:.3}, turbulent={}",
            gravity, drag, base.x, self.profile.turbulent
        );
    }

    /// Steady horizontal wind in cells per frame.
    fn base_wind(&self) -> Vec2 {
        let toward = self.atmosphere.state().wind_vector();
        Vec2::new(
            toward.x * WIND_CELLS_PER_MS * self.particles.config().wind_strength,
            0.0,
        )
    }

    /// Horizontal drift including the current gust, in cells per frame.
    ///
    /// [`WindModel::wind_vector`] points along the bearing the wind comes
    /// from, so the drift is its negation.
    fn gusty_drift(&self) -> f32 {
        -self.wind.wind_vector().x * WIND_CELLS_PER_MS * self.particles.config().wind_strength
    }

    /// Run one frame and draw it onto `surface`.
    pub fn frame<S: DrawSurface + ?Sized>(&mut self, surface: &mut S) -> FrameSummary {
        self.budget.begin_frame();
        self.queue.clear();
        self.frame_count += 1;

        self.budget.begin_phase("particles");
        let spawned = self.spawn_precipitation();
        self.budget.end_phase("particles");

        self.budget.begin_phase("physics");
        let gust_dt = 1.0 / self.budget.target_fps();
        self.wind
            .update_gusts(gust_dt, self.atmosphere.turbulence_intensity());
        self.particles.update(FRAME_DT);
        self.update_lightning();
        self.budget.end_phase("physics");

        self.budget.begin_phase("render");
        let sky_flash = self.flash_timer > SKY_FLASH_ABOVE;
        if sky_flash {
            self.draw_sky_flash();
        }
        let cloud_cells = self.render_clouds();
        self.render_precipitation();
        let lightning_cells = self.render_effects();
        if self.config.render.debug_overlay {
            self.draw_debug_overlay();
        }
        self.budget.end_phase("render");

        self.budget.begin_phase("misc");
        let commands = self.queue.len();
        let drawn = self.queue.execute(surface);
        self.budget.end_phase("misc");

        let frame_ms = self.budget.end_frame();
        self.stats.record_frame(frame_ms, self.particles.len());

        let summary = FrameSummary {
            frame: self.frame_count,
            frame_ms,
            spawned,
            particles: self.particles.len(),
            cloud_cells,
            lightning_cells,
            commands,
            drawn,
            quality_level: self.budget.quality_level(),
            sky_flash,
        };
        debug!(
            "Frame {}: {:.2}ms, {} particles (+{}), {} drawn, quality {:.2}",
            summary.frame,
            summary.frame_ms,
            summary.particles,
            summary.spawned,
            summary.drawn,
            summary.quality_level
        );
        summary
    }

    fn spawn_precipitation(&mut self) -> usize {
        let profile = self.profile;
        if !profile.spawns_particles() || self.width == 0 {
            return 0;
        }
        if self.frame_count % u64::from(profile.spawn_interval.max(1)) != 0 {
            return 0;
        }

        let quality = self.budget.quality_level();
        let count = ((profile.spawn_count as f32 * quality).round() as usize).max(1);
        let drift = self.gusty_drift() * SPAWN_WIND_SHARE;
        let width = f32::from(self.width);

        for _ in 0..count {
            let x = self.rng.random_range(0.0..width);
            let vx = sample_range(&mut self.rng, profile.velocity_x) + drift;
            let vy = sample_range(&mut self.rng, profile.velocity_y);
            let glyph = profile.glyphs.choose(&mut self.rng).copied().unwrap_or('·');

            self.particles.spawn(
                Particle::new(Vec2::new(x, SPAWN_ROW), profile.mass)
                    .with_velocity(Vec2::new(vx, vy))
                    .with_drag_coefficient(profile.drag_coefficient)
                    .with_buoyancy(profile.buoyancy)
                    .with_glyph(glyph)
                    .with_color(profile.color)
                    .with_max_age(profile.max_age),
            );
        }
        count
    }

    fn update_lightning(&mut self) {
        for bolt in &mut self.bolts {
            bolt.update();
        }
        self.bolts.retain(|b| !b.is_expired());

        if !self.profile.has_lightning {
            return;
        }
        if self.flash_timer > 0 {
            self.flash_timer -= 1;
            return;
        }
        if !self.rng.random_bool(LIGHTNING_PROBABILITY) {
            return;
        }

        let width = i32::from(self.width);
        let height = i32::from(self.height);
        let x = if width > 2 * STRIKE_EDGE_MARGIN {
            self.rng
                .random_range(STRIKE_EDGE_MARGIN..=width - STRIKE_EDGE_MARGIN)
        } else {
            width / 2
        };
        let end_y = if height / 2 <= height - 5 {
            self.rng.random_range(height / 2..=height - 5)
        } else {
            height - 1
        };
        let start_y = i32::from(self.profile.cloud_top);

        let bolt = LightningBolt::generate(&mut self.rng, x, start_y, end_y);
        debug!(
            "Lightning at x={} down to y={}: {} segments, {} frames",
            x,
            end_y,
            bolt.segments().len(),
            bolt.lifetime()
        );
        self.bolts.push(bolt);
        self.flash_timer = FLASH_FRAMES;
    }

    fn draw_sky_flash(&mut self) {
        let _scope = ProfilerScope::new(&mut self.stats, RenderLayer::Background);
        for y in 0..i32::from(self.height) {
            for x in 0..i32::from(self.width) {
                self.queue.push(
                    RenderCommand::new(x, y, ' ', ColorId::WHITE, RenderLayer::Background)
                        .with_attrs(TextAttributes::REVERSE),
                );
            }
        }
    }

    fn render_clouds(&mut self) -> usize {
        let _scope = ProfilerScope::new(&mut self.stats, RenderLayer::Clouds);
        self.clouds.advance();
        self.clouds.render(
            &mut self.queue,
            self.width,
            self.height,
            &self.profile,
            self.reading.cloud_cover_percent,
            self.budget.quality_level(),
        )
    }

    fn render_precipitation(&mut self) {
        let _scope = ProfilerScope::new(&mut self.stats, RenderLayer::Precipitation);
        for p in self.particles.particles() {
            self.queue.add(
                p.position.x.round() as i32,
                p.position.y.round() as i32,
                p.glyph,
                p.color,
                RenderLayer::Precipitation,
            );
        }
    }

    fn render_effects(&mut self) -> usize {
        let _scope = ProfilerScope::new(&mut self.stats, RenderLayer::Effects);
        self.bolts.iter().map(|b| b.render(&mut self.queue)).sum()
    }

    /// Queue the performance report, one line per row, on the debug layer.
    pub fn draw_debug_overlay(&mut self) {
        let lines = self.report().lines();
        let _scope = ProfilerScope::new(&mut self.stats, RenderLayer::Debug);
        for (y, line) in (0_i32..).zip(lines) {
            self.queue
                .add_text(0, y, &line, ColorId::GREEN, RenderLayer::Debug);
        }
    }

    pub fn report(&self) -> PerformanceReport {
        self.stats.report(self.budget.quality_level())
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn reading(&self) -> &WeatherReading {
        &self.reading
    }

    pub fn profile(&self) -> &PrecipitationProfile {
        &self.profile
    }

    pub fn atmosphere(&self) -> &AtmosphericModel {
        &self.atmosphere
    }

    pub fn particle_system(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn wind(&self) -> &WindModel {
        &self.wind
    }

    pub fn bolts(&self) -> &[LightningBolt] {
        &self.bolts
    }

    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn budget(&self) -> &FrameBudget {
        &self.budget
    }

    pub fn budget_mut(&mut self) -> &mut FrameBudget {
        &mut self.budget
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Uniform sample from `(lo, hi)`; `lo` when the range is empty.
fn sample_range<R: Rng>(rng: &mut R, (lo, hi): (f32, f32)) -> f32 {
    if hi > lo {
        rng.random_range(lo..hi)
    } else {
        lo
    }
}
