//! Configuration types for attractor simulation sessions.

use serde::{Deserialize, Serialize};

fn default_max_substeps() -> u32 {
    8
}

/// Per-session simulation configuration.
///
/// Any field may change between frames; the scheduler applies the new value
/// on the next integration step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationConfig {
    /// Number of particles in the pool.
    pub particle_count: usize,
    /// Rendered point size.
    pub particle_size: f32,
    /// Multiplier applied to the family's base step size.
    pub integration_speed: f32,
    /// Colour palette used by the shading program.
    pub color_scheme: ColorScheme,
    /// Fade particles with depth.
    pub depth_fading: bool,
    /// Use the parameterized shading program instead of flat points.
    pub enhanced_rendering: bool,
    /// Rotate the view continuously.
    pub auto_rotate: bool,
    /// Rotation rate in radians per second.
    pub auto_rotate_speed: f32,
    /// Fixed or adaptive step subdivision.
    pub step_mode: StepMode,
    /// Numerical integration scheme.
    pub method: IntegrationMethod,
    /// Seed for particle seeding. `None` draws from entropy.
    pub random_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_count: 2000,
            particle_size: 1.5,
            integration_speed: 1.0,
            color_scheme: ColorScheme::default(),
            depth_fading: true,
            enhanced_rendering: true,
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            step_mode: StepMode::default(),
            method: IntegrationMethod::default(),
            random_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.particle_count == 0 {
            return Err(ConfigError::InvalidParticleCount);
        }
        if !self.integration_speed.is_finite() || self.integration_speed <= 0.0 {
            return Err(ConfigError::InvalidSpeed);
        }
        if !self.particle_size.is_finite() || self.particle_size <= 0.0 {
            return Err(ConfigError::InvalidParticleSize);
        }
        if !self.auto_rotate_speed.is_finite() {
            return Err(ConfigError::InvalidRotateSpeed);
        }
        if let StepMode::Adaptive {
            max_displacement,
            max_substeps,
        } = self.step_mode
        {
            if !max_displacement.is_finite() || max_displacement <= 0.0 || max_substeps == 0 {
                return Err(ConfigError::InvalidStepMode);
            }
        }
        Ok(())
    }
}

/// Colour palettes understood by the shading program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Rainbow,
    Fire,
    Ocean,
    Aurora,
    Monochrome,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 5] = [
        ColorScheme::Rainbow,
        ColorScheme::Fire,
        ColorScheme::Ocean,
        ColorScheme::Aurora,
        ColorScheme::Monochrome,
    ];

    /// Index passed to the shading program.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|scheme| scheme.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorScheme::Rainbow => "rainbow",
            ColorScheme::Fire => "fire",
            ColorScheme::Ocean => "ocean",
            ColorScheme::Aurora => "aurora",
            ColorScheme::Monochrome => "monochrome",
        }
    }
}

/// Step subdivision policy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StepMode {
    /// One step of `base_step * speed` per frame.
    #[default]
    Fixed,
    /// Split the frame step so no substep moves a particle further than
    /// `max_displacement`.
    Adaptive {
        max_displacement: f32,
        #[serde(default = "default_max_substeps")]
        max_substeps: u32,
    },
}

/// Numerical integration scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationMethod {
    /// Forward Euler.
    #[default]
    Euler,
    /// Classic fourth-order Runge-Kutta.
    Rk4,
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Particle count must be non-zero")]
    InvalidParticleCount,
    #[error("Integration speed must be positive and finite")]
    InvalidSpeed,
    #[error("Particle size must be positive and finite")]
    InvalidParticleSize,
    #[error("Auto-rotate speed must be finite")]
    InvalidRotateSpeed,
    #[error("Adaptive step mode needs a positive displacement and at least one substep")]
    InvalidStepMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"particleCount": 500, "colorScheme": "ocean"}"#).unwrap();
        assert_eq!(config.particle_count, 500);
        assert_eq!(config.color_scheme, ColorScheme::Ocean);
        assert_eq!(config.integration_speed, 1.0);
        assert_eq!(config.step_mode, StepMode::Fixed);
    }

    #[test]
    fn test_adaptive_step_mode_serde() {
        let config: SimulationConfig = serde_json::from_str(
            r#"{"stepMode": {"type": "Adaptive", "max_displacement": 0.5}}"#,
        )
        .unwrap();
        assert_eq!(
            config.step_mode,
            StepMode::Adaptive {
                max_displacement: 0.5,
                max_substeps: 8,
            }
        );
    }

    #[test]
    fn test_validation_errors() {
        let config = SimulationConfig {
            particle_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParticleCount)
        ));

        let config = SimulationConfig {
            integration_speed: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidSpeed)));

        let config = SimulationConfig {
            step_mode: StepMode::Adaptive {
                max_displacement: 0.0,
                max_substeps: 4,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidStepMode)));
    }

    #[test]
    fn test_color_scheme_lookup() {
        assert_eq!(ColorScheme::from_name("Fire"), Some(ColorScheme::Fire));
        assert_eq!(ColorScheme::from_index(2), Some(ColorScheme::Ocean));
        assert_eq!(ColorScheme::from_index(9), None);
        for scheme in ColorScheme::ALL {
            assert_eq!(ColorScheme::from_index(scheme.index() as usize), Some(scheme));
        }
    }
}
