//! Numerical integration schemes.

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How a particle's state advances over one (sub-)step.
///
/// - `Euler`: `v += a·dt; x += v_old·dt`. Least stable.
/// - `SemiImplicit`: `v += a·dt; x += v_new·dt`. Symplectic, the default.
/// - `Verlet`: `x' = 2x - x_prev + a·dt²`, velocity derived from positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationScheme {
    Euler,
    #[default]
    SemiImplicit,
    Verlet,
}

impl IntegrationScheme {
    pub const ALL: [IntegrationScheme; 3] = [
        IntegrationScheme::Euler,
        IntegrationScheme::SemiImplicit,
        IntegrationScheme::Verlet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntegrationScheme::Euler => "euler",
            IntegrationScheme::SemiImplicit => "semi_implicit",
            IntegrationScheme::Verlet => "verlet",
        }
    }
}

impl std::fmt::Display for IntegrationScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IntegrationScheme {
    type Err = ConfigError;

    /// Accepts `semi_implicit`, `semi-implicit`, and `semiimplicit`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        if normalized == "semiimplicit" {
            return Ok(IntegrationScheme::SemiImplicit);
        }
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name() == normalized)
            .ok_or_else(|| ConfigError::UnknownIntegration(s.to_string()))
    }
}
