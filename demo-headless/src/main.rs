use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use stormscape_core::weather::{calculate_heat_index, calculate_wind_chill};
use stormscape_core::{
    EngineConfig, GlyphBuffer, IntegrationScheme, WeatherCondition, WeatherReading, WeatherScene,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Headless weather scene renderer
#[derive(Parser, Debug)]
#[command(name = "stormscape-demo")]
#[command(about = "Render a weather scene to text without a terminal", long_about = None)]
struct Args {
    /// Weather condition (clear, partly-cloudy, cloudy, fog, drizzle, rain, heavy-rain,
    /// freezing-rain, snow, heavy-snow, thunderstorm)
    #[arg(short, long, default_value = "rain")]
    condition: WeatherCondition,

    /// Temperature in °C
    #[arg(short, long, default_value_t = 12.0)]
    temperature: f32,

    /// Wind speed in m/s
    #[arg(short, long, default_value_t = 4.0)]
    wind_speed: f32,

    /// Wind direction in degrees (0=North, 90=East)
    #[arg(long, default_value_t = 270.0)]
    wind_direction: f32,

    /// Relative humidity in %
    #[arg(long, default_value_t = 80.0)]
    humidity: f32,

    /// Cloud cover in %
    #[arg(long, default_value_t = 70.0)]
    cloud_cover: f32,

    /// Sea-level pressure in hPa
    #[arg(long, default_value_t = 1008.0)]
    pressure: f32,

    /// Frames to run
    #[arg(short, long, default_value_t = 120)]
    frames: u32,

    /// Canvas width in cells
    #[arg(long, default_value_t = 80)]
    width: u16,

    /// Canvas height in cells
    #[arg(long, default_value_t = 24)]
    height: u16,

    /// Seed for every random choice (overrides the config file)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Integration scheme (euler, semi-implicit, verlet; overrides the config file)
    #[arg(long)]
    integration: Option<IntegrationScheme>,

    /// JSON engine configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Draw the performance overlay into the frame
    #[arg(long)]
    debug_overlay: bool,

    /// Print the final performance report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Report interval in frames (0 = no progress table)
    #[arg(short, long, default_value_t = 30)]
    report_interval: u32,
}

fn load_config(args: &Args) -> Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(integration) = args.integration {
        config.physics.integration = integration;
    }
    if args.debug_overlay {
        config.render.debug_overlay = true;
    }

    config.validate().context("invalid engine configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = load_config(&args)?;

    let reading = WeatherReading::new(args.condition)
        .with_temperature(args.temperature)
        .with_wind(args.wind_speed, args.wind_direction)
        .with_humidity(args.humidity)
        .with_cloud_cover(args.cloud_cover)
        .with_pressure(args.pressure);

    println!("=== Stormscape Headless Demo ===\n");

    let mut scene = WeatherScene::new(args.width, args.height, reading, config);
    let atmosphere = scene.atmosphere();
    let state = atmosphere.state();
    println!(
        "Weather: {} | {:.1}°C, {:.1} m/s from {:.0}°, RH {:.0}%, cloud {:.0}%, {:.1} hPa",
        reading.condition,
        state.temperature_c,
        state.wind_speed_ms,
        state.wind_direction_deg,
        state.humidity_percent,
        state.cloud_cover_percent,
        state.pressure_hpa
    );
    println!(
        "Stability: {} ({:?}), turbulence {:.2}, dew point {:.1}°C, visibility {:.0} m",
        atmosphere.classify_stability().letter(),
        atmosphere.classify_stability(),
        atmosphere.turbulence_intensity(),
        state.dew_point_c,
        atmosphere.visibility_estimate()
    );
    println!(
        "Feels like: wind chill {:.1}°C, heat index {:.1}°C",
        calculate_wind_chill(state.temperature_c, state.wind_speed_ms),
        calculate_heat_index(state.temperature_c, state.humidity_percent)
    );
    println!(
        "Engine: seed {}, {} integration x{} substeps, {} fps target\n",
        config.seed,
        config.physics.integration,
        config.physics.substeps,
        config.render.target_fps
    );

    let mut surface = GlyphBuffer::new(args.width, args.height);

    if args.report_interval > 0 {
        println!(" Frame | Particles | Clouds | Lightning | Drawn | ms     | Quality");
        println!("-------|-----------|--------|-----------|-------|--------|--------");
    }
    for frame in 1..=args.frames {
        surface.clear();
        let summary = scene.frame(&mut surface);
        if args.report_interval > 0 && frame % args.report_interval == 0 {
            println!(
                "{:6} | {:9} | {:6} | {:9} | {:5} | {:6.2} | {:.2}",
                summary.frame,
                summary.particles,
                summary.cloud_cells,
                summary.lightning_cells,
                summary.drawn,
                summary.frame_ms,
                summary.quality_level
            );
        }
    }

    println!("\n=== Final Frame ===");
    for line in surface.lines() {
        println!("{}", line.trim_end());
    }

    let report = scene.report();
    info!(
        "Rendered {} frames at {}x{}, {} dropped",
        report.total_frames, args.width, args.height, report.dropped_frames
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Performance ===");
        for line in report.lines() {
            println!("{line}");
        }
    }

    Ok(())
}
