//! End-to-end behaviour of the noise, physics, atmosphere, and render layers.
//!
//! Run with `RUST_LOG=debug cargo test --test scenarios` to see engine logs.

use approx::assert_relative_eq;
use ctor::ctor;
use stormscape_core::physics::{Bounds, DragForce, GravityForce};
use stormscape_core::render::{ColorId, RenderLayer};
use stormscape_core::weather::{calculate_heat_index, calculate_wind_chill};
use stormscape_core::{
    FrameBudget, IntegrationScheme, NoiseSource, Particle, ParticleSystem, PerlinNoise,
    PhysicsConfig, RenderQueue, Vec2,
};
use tracing_subscriber::EnvFilter;

#[ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A system with no culling and a loose speed limit.
fn open_system(integration: IntegrationScheme) -> ParticleSystem {
    let config = PhysicsConfig::default()
        .with_integration(integration)
        .with_max_velocity(1000.0)
        .with_bounds_check(false);
    ParticleSystem::new(config, Bounds::default())
}

fn fall(buoyancy: f32) -> Particle {
    let mut system = open_system(IntegrationScheme::SemiImplicit);
    system.add_force_generator(Box::new(GravityForce::new(1.0)));
    system.spawn(Particle::new(Vec2::zeros(), 1.0).with_buoyancy(buoyancy));
    for _ in 0..10 {
        system.update(1.0);
    }
    system.particles()[0].clone()
}

#[test]
fn scenario_perlin_is_reproducible() {
    let a = PerlinNoise::new(42);
    let b = PerlinNoise::new(42);
    for i in 0..100 {
        let (x, y) = (i as f32, (i * 7 % 13) as f32);
        assert_eq!(a.sample(x, y).to_bits(), b.sample(x, y).to_bits());
    }
}

#[test]
fn scenario_gravity_pulls_down() {
    let p = fall(0.0);
    assert!(p.position.y > 0.0);
    assert!(p.velocity.y > 0.0);
    assert_relative_eq!(p.position.y, 55.0, epsilon = 1e-3);
}

#[test]
fn scenario_buoyant_particle_falls_less() {
    let plain = fall(0.0);
    let buoyant = fall(0.8);
    assert!(buoyant.position.y < plain.position.y);
    assert!(buoyant.position.y > 0.0);
}

#[test]
fn scenario_sustained_overrun_lowers_quality() {
    let mut budget = FrameBudget::new(60.0);
    for _ in 0..20 {
        budget.begin_frame();
        budget.record_phase("physics", 50.0);
        budget.end_frame();
    }
    assert!(budget.quality_level() < 1.0);
    assert!(budget.quality_level() >= budget.quality_floor());
}

#[test]
fn scenario_wind_chill_guard() {
    assert!(calculate_wind_chill(0.0, 10.0) < 0.0);
    assert_eq!(calculate_wind_chill(15.0, 10.0), 15.0);
}

#[test]
fn scenario_layers_sort_back_to_front() {
    let mut queue = RenderQueue::new();
    queue.add(4, 4, 'u', ColorId::WHITE, RenderLayer::UiForeground);
    queue.add(4, 4, 'b', ColorId::WHITE, RenderLayer::Background);
    queue.add(4, 4, 'p', ColorId::WHITE, RenderLayer::Precipitation);
    let layers: Vec<RenderLayer> = queue.get_sorted().iter().map(|c| c.layer).collect();
    assert_eq!(
        layers,
        vec![
            RenderLayer::Background,
            RenderLayer::Precipitation,
            RenderLayer::UiForeground
        ]
    );
}

#[test]
fn position_and_velocity_grow_every_step() {
    let mut system = open_system(IntegrationScheme::SemiImplicit);
    system.add_force_generator(Box::new(GravityForce::new(0.5)));
    system.spawn(Particle::new(Vec2::zeros(), 1.0));
    let (mut y, mut vy) = (0.0, 0.0);
    for _ in 0..20 {
        system.update(0.5);
        let p = &system.particles()[0];
        assert!(p.position.y > y);
        assert!(p.velocity.y > vy);
        y = p.position.y;
        vy = p.velocity.y;
    }
}

#[test]
fn drag_alone_slows_every_step() {
    for scheme in [IntegrationScheme::Euler, IntegrationScheme::SemiImplicit, IntegrationScheme::Verlet] {
        let mut system = open_system(scheme);
        system.add_force_generator(Box::new(DragForce::new(0.05)));
        system.spawn(Particle::new(Vec2::zeros(), 1.0).with_velocity(Vec2::new(5.0, 0.0)));
        let mut speed = 5.0;
        for _ in 0..10 {
            system.update(0.5);
            let now = system.particles()[0].speed();
            assert!(now < speed, "{scheme}: {now} >= {speed}");
            speed = now;
        }
    }
}

#[test]
fn strong_drag_slows_fast_particles_every_step() {
    for scheme in [IntegrationScheme::Euler, IntegrationScheme::SemiImplicit, IntegrationScheme::Verlet] {
        let mut system = open_system(scheme);
        system.add_force_generator(Box::new(DragForce::new(1.0)));
        system.spawn(Particle::new(Vec2::zeros(), 1.0).with_velocity(Vec2::new(5.0, 0.0)));
        let mut speed = 5.0;
        for _ in 0..6 {
            system.update(1.0);
            let p = &system.particles()[0];
            assert!(p.velocity.x > 0.0, "{scheme}: drag reversed the particle");
            assert!(p.speed() < speed, "{scheme}: {} >= {speed}", p.speed());
            speed = p.speed();
        }
    }
}

#[test]
fn speed_limit_holds_for_every_scheme() {
    for scheme in [IntegrationScheme::Euler, IntegrationScheme::SemiImplicit, IntegrationScheme::Verlet] {
        let config = PhysicsConfig::default()
            .with_integration(scheme)
            .with_max_velocity(2.0)
            .with_bounds_check(false);
        let mut system = ParticleSystem::new(config, Bounds::default());
        system.add_force_generator(Box::new(GravityForce::new(3.0)));
        system.spawn(Particle::new(Vec2::zeros(), 1.0).with_velocity(Vec2::new(4.0, 0.0)));
        for _ in 0..15 {
            system.update(1.0);
            assert!(system.particles()[0].speed() <= 2.0 + 1e-4);
        }
    }
}

#[test]
fn particles_die_at_max_age() {
    let mut system = open_system(IntegrationScheme::SemiImplicit);
    system.spawn(Particle::new(Vec2::new(5.0, 5.0), 1.0).with_max_age(3));
    system.spawn(Particle::new(Vec2::new(6.0, 5.0), 1.0).with_max_age(0));
    system.spawn(Particle::new(Vec2::new(7.0, 5.0), 1.0).with_max_age(-1));

    system.update(1.0);
    system.update(1.0);
    assert_eq!(system.len(), 3);
    system.update(1.0);
    assert_eq!(system.len(), 2);
    for _ in 0..100 {
        system.update(1.0);
    }
    assert_eq!(system.len(), 2);
}

#[test]
fn escaped_particles_are_removed() {
    let mut system = ParticleSystem::new(PhysicsConfig::default(), Bounds::new(0.0, 0.0, 10.0, 10.0));
    system.spawn(Particle::new(Vec2::new(5.0, 5.0), 1.0));
    system.spawn(Particle::new(Vec2::new(14.5, 5.0), 1.0));
    system.spawn(Particle::new(Vec2::new(15.5, 5.0), 1.0));
    system.spawn(Particle::new(Vec2::new(5.0, -6.0), 1.0));
    system.update(1.0);

    assert_eq!(system.len(), 2);
    assert!(system
        .particles()
        .iter()
        .all(|p| p.position.x <= 15.0 && p.position.y >= -5.0));
    assert_eq!(system.stats().active, 2);
    assert_eq!(system.stats().peak, 4);
}

#[test]
fn comfort_indices_pass_through_outside_their_domain() {
    for t in [10.0, 12.5, 30.0] {
        assert_eq!(calculate_wind_chill(t, 25.0), t);
    }
    for t in [-20.0, 0.0, 9.0] {
        assert_eq!(calculate_wind_chill(t, 1.0), t);
    }
    for rh in [0.0, 50.0, 100.0] {
        assert_eq!(calculate_heat_index(26.0, rh), 26.0);
    }
    assert!(calculate_heat_index(35.0, 70.0) > 35.0);
}

#[test]
fn quality_stays_above_floor_under_endless_overrun() {
    let mut budget = FrameBudget::new(60.0);
    let mut last = budget.quality_level();
    for frame in 0..200 {
        budget.adjust_quality(100.0);
        assert!(budget.quality_level() <= last);
        assert!(budget.quality_level() >= 0.3);
        if frame == 5 {
            assert!(budget.quality_level() < 1.0);
        }
        last = budget.quality_level();
    }
    assert_relative_eq!(budget.quality_level(), 0.3, epsilon = 1e-5);
}
