//! Whole-scene frame loop: determinism, weather changes, configuration.

use ctor::ctor;
use stormscape_core::render::RenderLayer;
use stormscape_core::{
    EngineConfig, GlyphBuffer, RenderConfig, WeatherCondition, WeatherReading, WeatherScene,
};
use tracing_subscriber::EnvFilter;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Quality pinned at 1.0 so wall-clock timing cannot change what is drawn.
fn pinned(seed: u64) -> EngineConfig {
    EngineConfig::default()
        .with_seed(seed)
        .with_render(RenderConfig::default().with_quality_floor(1.0))
}

fn render(reading: WeatherReading, config: EngineConfig, frames: usize) -> GlyphBuffer {
    let mut scene = WeatherScene::new(60, 24, reading, config);
    let mut surface = GlyphBuffer::new(60, 24);
    for _ in 0..frames {
        surface.clear();
        scene.frame(&mut surface);
    }
    surface
}

#[test]
fn same_seed_draws_identical_frames() {
    let reading = WeatherReading::new(WeatherCondition::Thunderstorm)
        .with_wind(8.0, 250.0)
        .with_cloud_cover(85.0);
    let a = render(reading, pinned(11), 120);
    let b = render(reading, pinned(11), 120);
    assert_eq!(a, b);
    assert!(a.filled_cells() > 0);
}

#[test]
fn different_seeds_draw_different_skies() {
    let reading = WeatherReading::new(WeatherCondition::Cloudy).with_cloud_cover(60.0);
    let a = render(reading, pinned(1), 5);
    let b = render(reading, pinned(2), 5);
    assert_ne!(a.lines(), b.lines());
}

#[test]
fn more_cover_draws_more_cloud() {
    let thin = render(
        WeatherReading::new(WeatherCondition::Cloudy).with_cloud_cover(20.0),
        pinned(5),
        1,
    );
    let thick = render(
        WeatherReading::new(WeatherCondition::Cloudy).with_cloud_cover(90.0),
        pinned(5),
        1,
    );
    assert!(thick.filled_cells() > thin.filled_cells());
}

#[test]
fn set_weather_keeps_live_particles() {
    let mut scene = WeatherScene::new(60, 24, WeatherReading::new(WeatherCondition::HeavyRain), pinned(4));
    let mut surface = GlyphBuffer::new(60, 24);
    for _ in 0..6 {
        scene.frame(&mut surface);
    }
    let before = scene.particle_system().len();
    assert!(before > 0);

    scene.set_weather(WeatherReading::new(WeatherCondition::Snow).with_temperature(-4.0));
    assert_eq!(scene.particle_system().len(), before);
    assert_eq!(scene.particle_system().force_generators().len(), 3);
    assert!(scene.profile().turbulent);

    scene.frame(&mut surface);
    assert!(scene.particle_system().len() > 0);
}

#[test]
fn clear_weather_stops_spawning() {
    let mut scene = WeatherScene::new(60, 24, WeatherReading::new(WeatherCondition::Rain), pinned(9));
    let mut surface = GlyphBuffer::new(60, 24);
    for _ in 0..4 {
        scene.frame(&mut surface);
    }
    scene.set_weather(WeatherReading::new(WeatherCondition::Clear));
    for _ in 0..10 {
        assert_eq!(scene.frame(&mut surface).spawned, 0);
    }
}

#[test]
fn config_loaded_from_json_drives_the_scene() {
    let json = r#"{
        "seed": 99,
        "physics": { "integration": "verlet", "substeps": 2 },
        "render": { "target_fps": 20.0, "debug_overlay": true }
    }"#;
    let config: EngineConfig = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_ok());

    let mut scene = WeatherScene::new(80, 20, WeatherReading::new(WeatherCondition::Drizzle), config);
    assert_eq!(scene.budget().target_fps(), 20.0);
    assert_eq!(scene.particle_system().config().substeps, 2);

    let mut surface = GlyphBuffer::new(80, 20);
    scene.frame(&mut surface);
    assert!(scene.queue().layer_counts().contains_key(&RenderLayer::Debug));

    let back: EngineConfig = serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(back, config);
}

#[test]
fn report_tracks_every_frame() {
    let mut scene = WeatherScene::new(40, 16, WeatherReading::new(WeatherCondition::Rain), pinned(3));
    let mut surface = GlyphBuffer::new(40, 16);
    for _ in 0..70 {
        scene.frame(&mut surface);
    }
    let report = scene.report();
    assert_eq!(report.total_frames, 70);
    assert!(report.fps > 0.0);
    assert!(report.avg_particles > 0.0);
    assert_eq!(report.quality_level, 1.0);
    assert!(report.p95_ms >= 0.0);
}
