//! Attractor family identifiers and their coefficient sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Symbolic identifier of an equation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FamilyId {
    Lorenz,
    Thomas,
    Aizawa,
    Halvorsen,
    NewtonLeipnik,
}

impl FamilyId {
    /// Every implemented family, in gallery order.
    pub const ALL: [FamilyId; 5] = [
        FamilyId::Lorenz,
        FamilyId::Thomas,
        FamilyId::Aizawa,
        FamilyId::Halvorsen,
        FamilyId::NewtonLeipnik,
    ];

    /// Canonical identifier string.
    pub fn as_str(self) -> &'static str {
        match self {
            FamilyId::Lorenz => "lorenz",
            FamilyId::Thomas => "thomas",
            FamilyId::Aizawa => "aizawa",
            FamilyId::Halvorsen => "halvorsen",
            FamilyId::NewtonLeipnik => "newton-leipnik",
        }
    }

    /// Tunable coefficients of this family, with defaults and safe ranges.
    ///
    /// The order matches the field order of the family's parameter struct.
    pub fn coefficients(self) -> &'static [CoefficientSpec] {
        match self {
            FamilyId::Lorenz => &LORENZ_COEFFICIENTS,
            FamilyId::Thomas => &THOMAS_COEFFICIENTS,
            FamilyId::Aizawa => &AIZAWA_COEFFICIENTS,
            FamilyId::Halvorsen => &HALVORSEN_COEFFICIENTS,
            FamilyId::NewtonLeipnik => &NEWTON_LEIPNIK_COEFFICIENTS,
        }
    }
}

impl fmt::Display for FamilyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Requested attractor identifier is not implemented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown attractor family: {0:?}")]
pub struct UnknownFamily(pub String);

impl FromStr for FamilyId {
    type Err = UnknownFamily;

    /// Case-insensitive; `_`, spaces and `-` are interchangeable and may be
    /// omitted (`"newton-leipnik"`, `"newton_leipnik"`, `"newtonLeipnik"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "lorenz" => Ok(FamilyId::Lorenz),
            "thomas" => Ok(FamilyId::Thomas),
            "aizawa" => Ok(FamilyId::Aizawa),
            "halvorsen" => Ok(FamilyId::Halvorsen),
            "newtonleipnik" => Ok(FamilyId::NewtonLeipnik),
            _ => Err(UnknownFamily(s.to_string())),
        }
    }
}

/// Declared default and safe range of one named coefficient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoefficientSpec {
    /// Control identifier.
    pub key: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

impl CoefficientSpec {
    const fn new(key: &'static str, default: f32, min: f32, max: f32) -> Self {
        Self {
            key,
            default,
            min,
            max,
        }
    }

    /// Check whether a value lies in the declared range.
    #[inline]
    pub fn accepts(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

const LORENZ_COEFFICIENTS: [CoefficientSpec; 3] = [
    CoefficientSpec::new("sigma", 10.0, 0.1, 50.0),
    CoefficientSpec::new("rho", 28.0, 0.1, 100.0),
    CoefficientSpec::new("beta", 8.0 / 3.0, 0.1, 10.0),
];

const THOMAS_COEFFICIENTS: [CoefficientSpec; 1] = [CoefficientSpec::new("b", 0.19, 0.05, 0.5)];

const AIZAWA_COEFFICIENTS: [CoefficientSpec; 6] = [
    CoefficientSpec::new("a", 0.95, 0.1, 2.0),
    CoefficientSpec::new("b", 0.7, 0.1, 2.0),
    CoefficientSpec::new("c", 0.6, 0.1, 2.0),
    CoefficientSpec::new("d", 3.5, 0.5, 10.0),
    CoefficientSpec::new("e", 0.25, 0.0, 1.0),
    CoefficientSpec::new("f", 0.1, 0.0, 1.0),
];

const HALVORSEN_COEFFICIENTS: [CoefficientSpec; 1] = [CoefficientSpec::new("a", 1.4, 0.5, 3.0)];

const NEWTON_LEIPNIK_COEFFICIENTS: [CoefficientSpec; 2] = [
    CoefficientSpec::new("a", 0.4, 0.1, 1.0),
    CoefficientSpec::new("b", 0.175, 0.05, 0.5),
];

/// Lorenz system coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorenzParams {
    pub sigma: f32,
    pub rho: f32,
    pub beta: f32,
}

impl Default for LorenzParams {
    fn default() -> Self {
        Self {
            sigma: 10.0,
            rho: 28.0,
            beta: 8.0 / 3.0,
        }
    }
}

/// Thomas cyclically symmetric system; `b` is the damping coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThomasParams {
    pub b: f32,
}

impl Default for ThomasParams {
    fn default() -> Self {
        Self { b: 0.19 }
    }
}

/// Aizawa system coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AizawaParams {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Default for AizawaParams {
    fn default() -> Self {
        Self {
            a: 0.95,
            b: 0.7,
            c: 0.6,
            d: 3.5,
            e: 0.25,
            f: 0.1,
        }
    }
}

/// Halvorsen cyclically symmetric system; `a` is the damping coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalvorsenParams {
    pub a: f32,
}

impl Default for HalvorsenParams {
    fn default() -> Self {
        Self { a: 1.4 }
    }
}

/// Newton-Leipnik system coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewtonLeipnikParams {
    pub a: f32,
    pub b: f32,
}

impl Default for NewtonLeipnikParams {
    fn default() -> Self {
        Self { a: 0.4, b: 0.175 }
    }
}

/// Coefficients for one equation family, tagged by family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "kebab-case")]
pub enum AttractorParameters {
    Lorenz(LorenzParams),
    Thomas(ThomasParams),
    Aizawa(AizawaParams),
    Halvorsen(HalvorsenParams),
    NewtonLeipnik(NewtonLeipnikParams),
}

impl AttractorParameters {
    /// Documented defaults for a family.
    pub fn defaults(family: FamilyId) -> Self {
        match family {
            FamilyId::Lorenz => Self::Lorenz(LorenzParams::default()),
            FamilyId::Thomas => Self::Thomas(ThomasParams::default()),
            FamilyId::Aizawa => Self::Aizawa(AizawaParams::default()),
            FamilyId::Halvorsen => Self::Halvorsen(HalvorsenParams::default()),
            FamilyId::NewtonLeipnik => Self::NewtonLeipnik(NewtonLeipnikParams::default()),
        }
    }

    /// Build from values ordered as in [`FamilyId::coefficients`].
    ///
    /// Missing trailing values take the family default.
    pub fn from_values(family: FamilyId, values: &[f32]) -> Self {
        let specs = family.coefficients();
        let v = |i: usize| values.get(i).copied().unwrap_or(specs[i].default);

        match family {
            FamilyId::Lorenz => Self::Lorenz(LorenzParams {
                sigma: v(0),
                rho: v(1),
                beta: v(2),
            }),
            FamilyId::Thomas => Self::Thomas(ThomasParams { b: v(0) }),
            FamilyId::Aizawa => Self::Aizawa(AizawaParams {
                a: v(0),
                b: v(1),
                c: v(2),
                d: v(3),
                e: v(4),
                f: v(5),
            }),
            FamilyId::Halvorsen => Self::Halvorsen(HalvorsenParams { a: v(0) }),
            FamilyId::NewtonLeipnik => Self::NewtonLeipnik(NewtonLeipnikParams { a: v(0), b: v(1) }),
        }
    }

    /// Coefficient values in declaration order.
    pub fn values(&self) -> Vec<f32> {
        match *self {
            Self::Lorenz(p) => vec![p.sigma, p.rho, p.beta],
            Self::Thomas(p) => vec![p.b],
            Self::Aizawa(p) => vec![p.a, p.b, p.c, p.d, p.e, p.f],
            Self::Halvorsen(p) => vec![p.a],
            Self::NewtonLeipnik(p) => vec![p.a, p.b],
        }
    }

    /// Family these coefficients belong to.
    pub fn family(&self) -> FamilyId {
        match self {
            Self::Lorenz(_) => FamilyId::Lorenz,
            Self::Thomas(_) => FamilyId::Thomas,
            Self::Aizawa(_) => FamilyId::Aizawa,
            Self::Halvorsen(_) => FamilyId::Halvorsen,
            Self::NewtonLeipnik(_) => FamilyId::NewtonLeipnik,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parse_variants() {
        assert_eq!("lorenz".parse::<FamilyId>(), Ok(FamilyId::Lorenz));
        assert_eq!("Thomas".parse::<FamilyId>(), Ok(FamilyId::Thomas));
        assert_eq!(
            "newton-leipnik".parse::<FamilyId>(),
            Ok(FamilyId::NewtonLeipnik)
        );
        assert_eq!(
            "newtonLeipnik".parse::<FamilyId>(),
            Ok(FamilyId::NewtonLeipnik)
        );
        assert_eq!(
            "newton_leipnik".parse::<FamilyId>(),
            Ok(FamilyId::NewtonLeipnik)
        );
    }

    #[test]
    fn test_unknown_family_rejected() {
        let err = "rossler".parse::<FamilyId>().unwrap_err();
        assert_eq!(err, UnknownFamily("rossler".to_string()));
        assert!("".parse::<FamilyId>().is_err());
    }

    #[test]
    fn test_canonical_names_roundtrip() {
        for family in FamilyId::ALL {
            assert_eq!(family.as_str().parse::<FamilyId>(), Ok(family));
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.as_str()));
        }
    }

    #[test]
    fn test_defaults_match_coefficient_specs() {
        for family in FamilyId::ALL {
            let params = AttractorParameters::defaults(family);
            let expected: Vec<f32> = family.coefficients().iter().map(|s| s.default).collect();
            assert_eq!(params.values(), expected);
            assert_eq!(params.family(), family);
            for spec in family.coefficients() {
                assert!(spec.accepts(spec.default), "{family} {} default out of range", spec.key);
            }
        }
    }

    #[test]
    fn test_from_values_fills_missing() {
        let params = AttractorParameters::from_values(FamilyId::Lorenz, &[12.0]);
        assert_eq!(
            params,
            AttractorParameters::Lorenz(LorenzParams {
                sigma: 12.0,
                rho: 28.0,
                beta: 8.0 / 3.0,
            })
        );
    }

    #[test]
    fn test_parameters_serde_tagged() {
        let params = AttractorParameters::defaults(FamilyId::NewtonLeipnik);
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"family\":\"newton-leipnik\""));
        let back: AttractorParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back, params);
    }
}
