//! Seeding strategies for initializing particle pools.

use serde::{Deserialize, Serialize};

use super::FamilyId;

/// Weight of the Newton-Leipnik primary basin region.
pub const NEWTON_LEIPNIK_PRIMARY_WEIGHT: f32 = 0.4;
/// Weight of the Newton-Leipnik wide exploration region.
pub const NEWTON_LEIPNIK_EXPLORATION_WEIGHT: f32 = 0.4;
/// Weight of the Newton-Leipnik near-origin region.
pub const NEWTON_LEIPNIK_ORIGIN_WEIGHT: f32 = 0.2;

/// Centre of the Newton-Leipnik primary basin.
pub const NEWTON_LEIPNIK_BASIN_CENTER: [f32; 3] = [0.349, 0.0, -0.16];

/// How fresh particle states are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SeedStrategy {
    /// Uniform offsets inside an axis-aligned cube.
    UniformCube {
        /// Cube centre.
        center: [f32; 3],
        /// Half of the cube's edge length.
        half_extent: f32,
    },
    /// Weighted mixture of regions; one region is picked per particle.
    Mixture {
        /// Candidate regions. Weights need not sum to one.
        regions: Vec<SeedRegion>,
    },
}

/// One weighted region of a [`SeedStrategy::Mixture`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedRegion {
    /// Relative selection weight.
    pub weight: f32,
    /// Region shape.
    pub shape: SeedShape,
}

/// Sampling shape of a seed region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SeedShape {
    /// Uniform offsets inside an axis-aligned cube.
    Cube { center: [f32; 3], half_extent: f32 },
    /// Isotropic Gaussian cloud.
    Gaussian { center: [f32; 3], spread: f32 },
}

impl SeedStrategy {
    /// Uniform cube centred on the origin.
    pub fn origin_cube(half_extent: f32) -> Self {
        Self::UniformCube {
            center: [0.0; 3],
            half_extent,
        }
    }

    /// Default strategy for a family.
    ///
    /// Newton-Leipnik uses a three-region mixture because uniform seeding
    /// under-explores its double-lobed structure.
    pub fn default_for(family: FamilyId) -> Self {
        match family {
            FamilyId::Lorenz => Self::origin_cube(2.0),
            FamilyId::Thomas => Self::origin_cube(1.0),
            FamilyId::Aizawa => Self::origin_cube(0.5),
            FamilyId::Halvorsen => Self::origin_cube(1.0),
            FamilyId::NewtonLeipnik => Self::newton_leipnik_mixture(),
        }
    }

    /// Primary basin, wide exploration and near-origin mixture.
    pub fn newton_leipnik_mixture() -> Self {
        Self::Mixture {
            regions: vec![
                SeedRegion {
                    weight: NEWTON_LEIPNIK_PRIMARY_WEIGHT,
                    shape: SeedShape::Gaussian {
                        center: NEWTON_LEIPNIK_BASIN_CENTER,
                        spread: 0.05,
                    },
                },
                SeedRegion {
                    weight: NEWTON_LEIPNIK_EXPLORATION_WEIGHT,
                    shape: SeedShape::Cube {
                        center: [0.0; 3],
                        half_extent: 0.5,
                    },
                },
                SeedRegion {
                    weight: NEWTON_LEIPNIK_ORIGIN_WEIGHT,
                    shape: SeedShape::Cube {
                        center: [0.0; 3],
                        half_extent: 0.05,
                    },
                },
            ],
        }
    }

    /// Check that the strategy can produce samples.
    ///
    /// Every sample drawn from a valid strategy is finite.
    pub fn validate(&self) -> Result<(), SeedError> {
        match self {
            Self::UniformCube {
                center,
                half_extent,
            } => check_region(center, *half_extent),
            Self::Mixture { regions } => {
                if regions.is_empty() {
                    return Err(SeedError::EmptyMixture);
                }
                let mut total = 0.0f32;
                for (i, region) in regions.iter().enumerate() {
                    if !region.weight.is_finite() || region.weight < 0.0 {
                        return Err(SeedError::InvalidWeight { region: i });
                    }
                    total += region.weight;
                    match &region.shape {
                        SeedShape::Cube {
                            center,
                            half_extent,
                        } => check_region(center, *half_extent)?,
                        SeedShape::Gaussian { center, spread } => check_region(center, *spread)?,
                    }
                }
                if !total.is_finite() {
                    return Err(SeedError::WeightOverflow);
                }
                if total <= 0.0 {
                    return Err(SeedError::EmptyMixture);
                }
                Ok(())
            }
        }
    }
}

fn check_region(center: &[f32; 3], extent: f32) -> Result<(), SeedError> {
    if !extent.is_finite() || extent < 0.0 {
        return Err(SeedError::InvalidExtent);
    }
    // The sampled span must stay representable on every axis.
    if center.iter().any(|c| !(c.abs() + extent).is_finite()) {
        return Err(SeedError::InvalidCenter);
    }
    Ok(())
}

/// Seed strategy validation errors.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Seed mixture needs at least one region with positive weight")]
    EmptyMixture,
    #[error("Seed region {region} has a negative or non-finite weight")]
    InvalidWeight { region: usize },
    #[error("Seed extent must be finite and non-negative")]
    InvalidExtent,
    #[error("Seed centre must be finite and leave room for the extent")]
    InvalidCenter,
    #[error("Seed mixture weights overflow when summed")]
    WeightOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newton_leipnik_ratios() {
        let SeedStrategy::Mixture { regions } = SeedStrategy::default_for(FamilyId::NewtonLeipnik)
        else {
            panic!("Newton-Leipnik should use a mixture");
        };
        let weights: Vec<f32> = regions.iter().map(|r| r.weight).collect();
        assert_eq!(weights, vec![0.4, 0.4, 0.2]);
    }

    #[test]
    fn test_defaults_validate() {
        for family in FamilyId::ALL {
            assert!(SeedStrategy::default_for(family).validate().is_ok());
        }
    }

    #[test]
    fn test_invalid_mixtures() {
        let empty = SeedStrategy::Mixture { regions: vec![] };
        assert!(matches!(empty.validate(), Err(SeedError::EmptyMixture)));

        let negative = SeedStrategy::Mixture {
            regions: vec![SeedRegion {
                weight: -1.0,
                shape: SeedShape::Cube {
                    center: [0.0; 3],
                    half_extent: 1.0,
                },
            }],
        };
        assert!(matches!(
            negative.validate(),
            Err(SeedError::InvalidWeight { region: 0 })
        ));

        let nan_extent = SeedStrategy::origin_cube(f32::NAN);
        assert!(matches!(nan_extent.validate(), Err(SeedError::InvalidExtent)));
    }

    #[test]
    fn test_non_finite_centers_rejected() {
        let nan_cube = SeedStrategy::UniformCube {
            center: [f32::NAN, 0.0, 0.0],
            half_extent: 1.0,
        };
        assert!(matches!(nan_cube.validate(), Err(SeedError::InvalidCenter)));

        let infinite_gaussian = SeedStrategy::Mixture {
            regions: vec![SeedRegion {
                weight: 1.0,
                shape: SeedShape::Gaussian {
                    center: [0.0, f32::INFINITY, 0.0],
                    spread: 0.1,
                },
            }],
        };
        assert!(matches!(
            infinite_gaussian.validate(),
            Err(SeedError::InvalidCenter)
        ));

        let overflowing_span = SeedStrategy::UniformCube {
            center: [f32::MAX, 0.0, 0.0],
            half_extent: f32::MAX,
        };
        assert!(matches!(
            overflowing_span.validate(),
            Err(SeedError::InvalidCenter)
        ));
    }

    #[test]
    fn test_weight_sum_overflow_rejected() {
        let region = SeedRegion {
            weight: f32::MAX,
            shape: SeedShape::Cube {
                center: [0.0; 3],
                half_extent: 1.0,
            },
        };
        let strategy = SeedStrategy::Mixture {
            regions: vec![region.clone(), region],
        };
        assert!(matches!(strategy.validate(), Err(SeedError::WeightOverflow)));
    }

    #[test]
    fn test_strategy_serde() {
        let json = r#"{"type":"UniformCube","center":[0.0,0.0,1.0],"half_extent":0.25}"#;
        let strategy: SeedStrategy = serde_json::from_str(json).unwrap();
        assert_eq!(
            strategy,
            SeedStrategy::UniformCube {
                center: [0.0, 0.0, 1.0],
                half_extent: 0.25,
            }
        );
    }
}
