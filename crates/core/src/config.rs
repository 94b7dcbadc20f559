//! Engine configuration.
//!
//! Every struct deserializes with defaults for missing fields, so a JSON file
//! only needs the values it changes. Constructors sanitize bad values on their
//! own; `validate` is for callers that would rather reject them.

use crate::physics::PhysicsConfig;
use crate::render::PhaseBudgets;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("substeps must be at least 1")]
    InvalidSubsteps,
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("phase budget '{phase}' must be within [0, 1], got {value}")]
    PhaseBudgetOutOfRange { phase: &'static str, value: f32 },
    #[error("phase budgets sum to {total}, which exceeds 1.0")]
    PhaseBudgetOverflow { total: f32 },
    #[error("quality floor must be within (0, 1], got {0}")]
    QualityFloorOutOfRange(f32),
    #[error("unknown weather condition '{0}'")]
    UnknownCondition(String),
    #[error("unknown integration scheme '{0}'")]
    UnknownIntegration(String),
}

/// Slack allowed when checking that phase ratios sum to at most 1.
const BUDGET_SUM_TOLERANCE: f32 = 1e-4;

/// Frame pacing and render settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub target_fps: f32,
    pub phase_budgets: PhaseBudgets,
    /// Lowest quality level adaptive control may reach.
    pub quality_floor: f32,
    /// Frames kept in each rolling statistics window.
    pub stats_window: usize,
    pub debug_overlay: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_fps: 30.0,
            phase_budgets: PhaseBudgets::default(),
            quality_floor: 0.3,
            stats_window: 60,
            debug_overlay: false,
        }
    }
}

impl RenderConfig {
    pub fn with_target_fps(mut self, target_fps: f32) -> Self {
        self.target_fps = target_fps;
        self
    }

    pub fn with_quality_floor(mut self, quality_floor: f32) -> Self {
        self.quality_floor = quality_floor;
        self
    }

    pub fn with_debug_overlay(mut self, enabled: bool) -> Self {
        self.debug_overlay = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_fps.is_nan() || self.target_fps <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "target_fps",
                value: self.target_fps,
            });
        }
        if !(self.quality_floor > 0.0 && self.quality_floor <= 1.0) {
            return Err(ConfigError::QualityFloorOutOfRange(self.quality_floor));
        }
        if self.stats_window == 0 {
            return Err(ConfigError::NonPositive {
                field: "stats_window",
                value: 0.0,
            });
        }
        for (phase, value) in self.phase_budgets.entries() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::PhaseBudgetOutOfRange { phase, value });
            }
        }
        let total = self.phase_budgets.total();
        if total > 1.0 + BUDGET_SUM_TOLERANCE {
            return Err(ConfigError::PhaseBudgetOverflow { total });
        }
        Ok(())
    }
}

/// Everything a [`WeatherScene`](crate::scene::WeatherScene) needs besides the weather.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for every random choice the scene makes.
    pub seed: u64,
    pub physics: PhysicsConfig,
    pub render: RenderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            physics: PhysicsConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_physics(mut self, physics: PhysicsConfig) -> Self {
        self.physics = physics;
        self
    }

    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.physics.validate()?;
        self.render.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::IntegrationScheme;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_substeps() {
        let config = EngineConfig::default().with_physics(PhysicsConfig::default().with_substeps(0));
        assert_eq!(config.validate(), Err(ConfigError::InvalidSubsteps));
    }

    #[test]
    fn rejects_overflowing_phase_budgets() {
        let mut render = RenderConfig::default();
        render.phase_budgets.render = 0.9;
        let err = EngineConfig::default().with_render(render).validate();
        assert!(matches!(err, Err(ConfigError::PhaseBudgetOverflow { total }) if total > 1.0));
    }

    #[test]
    fn rejects_out_of_range_phase() {
        let mut render = RenderConfig::default();
        render.phase_budgets.misc = -0.1;
        assert!(matches!(
            render.validate(),
            Err(ConfigError::PhaseBudgetOutOfRange { phase: "misc", .. })
        ));
    }

    #[test]
    fn rejects_bad_floor_and_fps() {
        assert_eq!(
            RenderConfig::default().with_quality_floor(0.0).validate(),
            Err(ConfigError::QualityFloorOutOfRange(0.0))
        );
        assert!(matches!(
            RenderConfig::default().with_target_fps(0.0).validate(),
            Err(ConfigError::NonPositive { field: "target_fps", .. })
        ));
    }

    #[test]
    fn json_round_trip() {
        let config = EngineConfig::default()
            .with_seed(7)
            .with_physics(PhysicsConfig::default().with_integration(IntegrationScheme::Verlet))
            .with_render(RenderConfig::default().with_debug_overlay(true));
        let json = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"seed": 3, "physics": {"integration": "euler"}}"#).unwrap();
        assert_eq!(config.seed, 3);
        assert_eq!(config.physics.integration, IntegrationScheme::Euler);
        assert_eq!(config.physics.substeps, 1);
        assert_eq!(config.render, RenderConfig::default());
    }

    #[test]
    fn errors_display_the_value() {
        let err = ConfigError::UnknownCondition("hail".into());
        assert_eq!(err.to_string(), "unknown weather condition 'hail'");
    }
}
