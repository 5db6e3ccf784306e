//! Control binding - validation of externally supplied control maps.
//!
//! The UI layer hands over a flat map of control identifiers to loosely typed
//! values. Binding turns that map into a [`SimulationConfig`] and
//! [`AttractorParameters`] that are safe to integrate:
//!
//! - missing controls take the family's documented default
//! - `particleCount` is clamped into `[1, platform_safe_max]`
//! - wrongly typed or out-of-range values are replaced by the default
//! - unknown keys are ignored

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    AttractorParameters, ColorScheme, FamilyId, IntegrationMethod, SimulationConfig, StepMode,
};

/// Control identifiers understood by [`ControlBinding`].
pub mod keys {
    pub const PARTICLE_COUNT: &str = "particleCount";
    pub const PARTICLE_SIZE: &str = "particleSize";
    pub const INTEGRATION_SPEED: &str = "integrationSpeed";
    pub const COLOR_SCHEME: &str = "colorScheme";
    pub const DEPTH_FADING: &str = "depthFading";
    pub const ENHANCED_RENDERING: &str = "enhancedRendering";
    pub const AUTO_ROTATE: &str = "autoRotate";
    pub const AUTO_ROTATE_SPEED: &str = "autoRotateSpeed";
    pub const INTEGRATION_METHOD: &str = "integrationMethod";
    pub const ADAPTIVE_STEP: &str = "adaptiveStep";
    pub const MAX_DISPLACEMENT: &str = "maxDisplacement";
    pub const RANDOM_SEED: &str = "randomSeed";
}

/// A single control value as produced by the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<bool> for ControlValue {
    fn from(v: bool) -> Self {
        ControlValue::Flag(v)
    }
}

impl From<f64> for ControlValue {
    fn from(v: f64) -> Self {
        ControlValue::Number(v)
    }
}

impl From<f32> for ControlValue {
    fn from(v: f32) -> Self {
        ControlValue::Number(v as f64)
    }
}

impl From<usize> for ControlValue {
    fn from(v: usize) -> Self {
        ControlValue::Number(v as f64)
    }
}

impl From<&str> for ControlValue {
    fn from(v: &str) -> Self {
        ControlValue::Text(v.to_string())
    }
}

impl ControlValue {
    /// Numeric reading. Numeric strings are accepted; non-finite values are not.
    fn as_number(&self) -> Option<f64> {
        let n = match self {
            ControlValue::Number(n) => *n,
            ControlValue::Text(s) => s.trim().parse::<f64>().ok()?,
            ControlValue::Flag(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    fn as_flag(&self) -> Option<bool> {
        match self {
            ControlValue::Flag(b) => Some(*b),
            ControlValue::Text(s) if s.eq_ignore_ascii_case("true") => Some(true),
            ControlValue::Text(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

/// Flat map of control identifiers to values.
pub type ControlMap = BTreeMap<String, ControlValue>;

/// Particle-count ceiling supplied by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformBudget {
    /// Largest particle count the platform can integrate within a frame.
    pub safe_max: usize,
}

impl PlatformBudget {
    /// Conventional ceiling for constrained (mobile) devices.
    pub const MOBILE_SAFE_MAX: usize = 2500;
    /// Conventional ceiling for desktop devices.
    pub const DESKTOP_SAFE_MAX: usize = 10_000;

    /// Budget with the given ceiling; a zero ceiling is raised to one.
    pub fn new(safe_max: usize) -> Self {
        Self {
            safe_max: safe_max.max(1),
        }
    }

    pub fn mobile() -> Self {
        Self::new(Self::MOBILE_SAFE_MAX)
    }

    pub fn desktop() -> Self {
        Self::new(Self::DESKTOP_SAFE_MAX)
    }
}

impl Default for PlatformBudget {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Result of binding a control map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundControls {
    pub config: SimulationConfig,
    pub params: AttractorParameters,
}

impl BoundControls {
    /// Render back into a control map. Binding the result again is a no-op.
    pub fn to_control_map(&self) -> ControlMap {
        let c = &self.config;
        let mut map = ControlMap::new();
        map.insert(keys::PARTICLE_COUNT.into(), c.particle_count.into());
        map.insert(keys::PARTICLE_SIZE.into(), c.particle_size.into());
        map.insert(keys::INTEGRATION_SPEED.into(), c.integration_speed.into());
        map.insert(keys::COLOR_SCHEME.into(), c.color_scheme.name().into());
        map.insert(keys::DEPTH_FADING.into(), c.depth_fading.into());
        map.insert(keys::ENHANCED_RENDERING.into(), c.enhanced_rendering.into());
        map.insert(keys::AUTO_ROTATE.into(), c.auto_rotate.into());
        map.insert(keys::AUTO_ROTATE_SPEED.into(), c.auto_rotate_speed.into());
        let method = match c.method {
            IntegrationMethod::Euler => "euler",
            IntegrationMethod::Rk4 => "rk4",
        };
        map.insert(keys::INTEGRATION_METHOD.into(), method.into());
        if let StepMode::Adaptive {
            max_displacement, ..
        } = c.step_mode
        {
            map.insert(keys::ADAPTIVE_STEP.into(), true.into());
            map.insert(keys::MAX_DISPLACEMENT.into(), max_displacement.into());
        }
        if let Some(seed) = c.random_seed {
            map.insert(keys::RANDOM_SEED.into(), ControlValue::Number(seed as f64));
        }

        let family = self.params.family();
        for (spec, value) in family.coefficients().iter().zip(self.params.values()) {
            map.insert(spec.key.into(), value.into());
        }
        map
    }
}

/// Declared range of a numeric control.
struct Range {
    default: f32,
    min: f32,
    max: f32,
}

const PARTICLE_SIZE: Range = Range {
    default: 1.5,
    min: 0.1,
    max: 10.0,
};
const INTEGRATION_SPEED: Range = Range {
    default: 1.0,
    min: 0.1,
    max: 5.0,
};
const AUTO_ROTATE_SPEED: Range = Range {
    default: 0.5,
    min: 0.0,
    max: 5.0,
};
const MAX_DISPLACEMENT: Range = Range {
    default: 0.5,
    min: 0.01,
    max: 10.0,
};
const ADAPTIVE_MAX_SUBSTEPS: u32 = 8;

/// Validates control maps against safe ranges and the platform ceiling.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControlBinding {
    budget: PlatformBudget,
}

impl ControlBinding {
    pub fn new(budget: PlatformBudget) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> PlatformBudget {
        self.budget
    }

    /// Documented default particle count for a family, before the platform
    /// ceiling is applied.
    pub fn default_particle_count(family: FamilyId) -> usize {
        match family {
            FamilyId::Lorenz => 2000,
            FamilyId::Thomas => 3000,
            FamilyId::Aizawa => 2500,
            FamilyId::Halvorsen => 2000,
            FamilyId::NewtonLeipnik => 1500,
        }
    }

    /// Clamp a requested particle count into `[1, safe_max]`.
    pub fn clamp_particle_count(&self, requested: usize) -> usize {
        requested.clamp(1, self.budget.safe_max)
    }

    /// Bind a (possibly partial) control map for a family.
    pub fn bind(&self, family: FamilyId, controls: &ControlMap) -> BoundControls {
        let defaults = SimulationConfig::default();

        let particle_count = self.bind_particle_count(family, controls);
        let particle_size = bind_range(controls, keys::PARTICLE_SIZE, &PARTICLE_SIZE);
        let integration_speed = bind_range(controls, keys::INTEGRATION_SPEED, &INTEGRATION_SPEED);
        let auto_rotate_speed = bind_range(controls, keys::AUTO_ROTATE_SPEED, &AUTO_ROTATE_SPEED);

        let color_scheme = controls
            .get(keys::COLOR_SCHEME)
            .map(|value| {
                let scheme = match value {
                    ControlValue::Text(name) => ColorScheme::from_name(name)
                        .or_else(|| value.as_number().and_then(scheme_from_number)),
                    _ => value.as_number().and_then(scheme_from_number),
                };
                scheme.unwrap_or_else(|| {
                    invalid(keys::COLOR_SCHEME, value, defaults.color_scheme.name());
                    defaults.color_scheme
                })
            })
            .unwrap_or(defaults.color_scheme);

        let method = controls
            .get(keys::INTEGRATION_METHOD)
            .map(|value| match value {
                ControlValue::Text(s) if s.eq_ignore_ascii_case("euler") => IntegrationMethod::Euler,
                ControlValue::Text(s) if s.eq_ignore_ascii_case("rk4") => IntegrationMethod::Rk4,
                _ => {
                    invalid(keys::INTEGRATION_METHOD, value, "euler");
                    defaults.method
                }
            })
            .unwrap_or(defaults.method);

        let step_mode = if bind_flag(controls, keys::ADAPTIVE_STEP, false) {
            StepMode::Adaptive {
                max_displacement: bind_range(controls, keys::MAX_DISPLACEMENT, &MAX_DISPLACEMENT),
                max_substeps: ADAPTIVE_MAX_SUBSTEPS,
            }
        } else {
            StepMode::Fixed
        };

        let random_seed = controls.get(keys::RANDOM_SEED).and_then(|value| {
            match value.as_number() {
                Some(n) if n >= 0.0 && n <= u64::MAX as f64 => Some(n as u64),
                _ => {
                    invalid(keys::RANDOM_SEED, value, "entropy");
                    None
                }
            }
        });

        let config = SimulationConfig {
            particle_count,
            particle_size,
            integration_speed,
            color_scheme,
            depth_fading: bind_flag(controls, keys::DEPTH_FADING, defaults.depth_fading),
            enhanced_rendering: bind_flag(
                controls,
                keys::ENHANCED_RENDERING,
                defaults.enhanced_rendering,
            ),
            auto_rotate: bind_flag(controls, keys::AUTO_ROTATE, defaults.auto_rotate),
            auto_rotate_speed,
            step_mode,
            method,
            random_seed,
        };

        let values: Vec<f32> = family
            .coefficients()
            .iter()
            .map(|spec| {
                bind_range(
                    controls,
                    spec.key,
                    &Range {
                        default: spec.default,
                        min: spec.min,
                        max: spec.max,
                    },
                )
            })
            .collect();
        let params = AttractorParameters::from_values(family, &values);

        BoundControls { config, params }
    }

    fn bind_particle_count(&self, family: FamilyId, controls: &ControlMap) -> usize {
        let default = self.clamp_particle_count(Self::default_particle_count(family));
        let Some(value) = controls.get(keys::PARTICLE_COUNT) else {
            return default;
        };
        match value.as_number() {
            Some(n) => {
                let requested = n.round().max(0.0);
                if requested >= self.budget.safe_max as f64 {
                    self.budget.safe_max
                } else {
                    self.clamp_particle_count(requested as usize)
                }
            }
            None => {
                invalid(keys::PARTICLE_COUNT, value, default);
                default
            }
        }
    }
}

fn scheme_from_number(n: f64) -> Option<ColorScheme> {
    if n >= 0.0 && n.fract() == 0.0 {
        ColorScheme::from_index(n as usize)
    } else {
        None
    }
}

fn bind_range(controls: &ControlMap, key: &str, range: &Range) -> f32 {
    let Some(value) = controls.get(key) else {
        return range.default;
    };
    match value.as_number().map(|n| n as f32) {
        Some(v) if v.is_finite() && v >= range.min && v <= range.max => v,
        _ => {
            invalid(key, value, range.default);
            range.default
        }
    }
}

fn bind_flag(controls: &ControlMap, key: &str, default: bool) -> bool {
    let Some(value) = controls.get(key) else {
        return default;
    };
    value.as_flag().unwrap_or_else(|| {
        invalid(key, value, default);
        default
    })
}

fn invalid(key: &str, value: &ControlValue, default: impl std::fmt::Display) {
    log::debug!("Invalid control value {key}={value:?}, using default {default}");
}
