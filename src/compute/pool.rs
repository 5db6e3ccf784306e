//! Particle pool - fixed-capacity particle storage with family-aware seeding.

use rand::prelude::*;
use rand_distr::Normal;

use super::ParticleState;
use crate::schema::{SeedError, SeedShape, SeedStrategy};

/// Contiguous, exclusively owned array of particle states.
///
/// Slot `i` keeps its identity for the lifetime of the pool: reseeding
/// replaces the state in place, resizing builds a new pool.
pub struct ParticlePool {
    particles: Vec<ParticleState>,
    strategy: SeedStrategy,
    rng: StdRng,
    /// Prefix sums of mixture weights, empty for single-region strategies.
    cumulative_weights: Vec<f32>,
}

impl ParticlePool {
    /// Create and seed a pool of `count` particles.
    ///
    /// `random_seed` makes seeding deterministic; `None` draws from entropy.
    pub fn new(
        count: usize,
        strategy: SeedStrategy,
        random_seed: Option<u64>,
    ) -> Result<Self, SeedError> {
        strategy.validate()?;

        let rng = match random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let cumulative_weights = match &strategy {
            SeedStrategy::UniformCube { .. } => Vec::new(),
            SeedStrategy::Mixture { regions } => regions
                .iter()
                .scan(0.0f32, |acc, r| {
                    *acc += r.weight;
                    Some(*acc)
                })
                .collect(),
        };

        let mut pool = Self {
            particles: vec![ParticleState::default(); count],
            strategy,
            rng,
            cumulative_weights,
        };
        for i in 0..count {
            pool.reseed(i);
        }
        Ok(pool)
    }

    /// Number of slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Read-only view of every slot, in slot order.
    #[inline]
    pub fn particles(&self) -> &[ParticleState] {
        &self.particles
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<ParticleState> {
        self.particles.get(index).copied()
    }

    /// Overwrite one slot.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    #[inline]
    pub fn set(&mut self, index: usize, state: ParticleState) {
        self.particles[index] = state;
    }

    /// Seeding strategy in use.
    pub fn strategy(&self) -> &SeedStrategy {
        &self.strategy
    }

    /// Assign a fresh seed to one slot, leaving all others untouched.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn reseed(&mut self, index: usize) {
        let state = self.sample();
        self.particles[index] = state;
    }

    /// Draw one seed from the strategy.
    fn sample(&mut self) -> ParticleState {
        match &self.strategy {
            SeedStrategy::UniformCube {
                center,
                half_extent,
            } => sample_cube(&mut self.rng, *center, *half_extent),
            SeedStrategy::Mixture { regions } => {
                let total = self.cumulative_weights.last().copied().unwrap_or(0.0);
                let pick = self.rng.gen_range(0.0..total);
                let index = self
                    .cumulative_weights
                    .iter()
                    .position(|&w| pick < w)
                    .unwrap_or(regions.len() - 1);

                match regions[index].shape {
                    SeedShape::Cube {
                        center,
                        half_extent,
                    } => sample_cube(&mut self.rng, center, half_extent),
                    SeedShape::Gaussian { center, spread } => {
                        sample_gaussian(&mut self.rng, center, spread)
                    }
                }
            }
        }
    }
}

fn sample_cube(rng: &mut StdRng, center: [f32; 3], half_extent: f32) -> ParticleState {
    if half_extent == 0.0 {
        return ParticleState::new(center[0], center[1], center[2]);
    }
    let mut axis = |c: f32| c + rng.gen_range(-half_extent..=half_extent);
    ParticleState::new(axis(center[0]), axis(center[1]), axis(center[2]))
}

fn sample_gaussian(rng: &mut StdRng, center: [f32; 3], spread: f32) -> ParticleState {
    // Spread is validated finite and non-negative, so construction cannot fail.
    let Ok(normal) = Normal::new(0.0f32, spread) else {
        return ParticleState::new(center[0], center[1], center[2]);
    };
    let mut axis = |c: f32| c + normal.sample(&mut *rng);
    ParticleState::new(axis(center[0]), axis(center[1]), axis(center[2]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FamilyId, SeedRegion};

    #[test]
    fn test_pool_size_and_finiteness() {
        let pool = ParticlePool::new(500, SeedStrategy::origin_cube(1.0), Some(1)).unwrap();
        assert_eq!(pool.len(), 500);
        assert!(pool.particles().iter().all(|p| p.is_finite()));
        assert!(pool.particles().iter().all(|p| p.max_abs() <= 1.0));
    }

    #[test]
    fn test_seeded_pools_are_deterministic() {
        let a = ParticlePool::new(64, SeedStrategy::default_for(FamilyId::Lorenz), Some(9)).unwrap();
        let b = ParticlePool::new(64, SeedStrategy::default_for(FamilyId::Lorenz), Some(9)).unwrap();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn test_reseed_touches_only_one_slot() {
        let mut pool = ParticlePool::new(32, SeedStrategy::origin_cube(1.0), Some(3)).unwrap();
        let before = pool.particles().to_vec();
        pool.set(7, ParticleState::new(f32::NAN, 0.0, 0.0));
        pool.reseed(7);

        assert!(pool.get(7).unwrap().is_finite());
        for (i, (old, new)) in before.iter().zip(pool.particles()).enumerate() {
            if i != 7 {
                assert_eq!(old, new, "slot {i} changed");
            }
        }
    }

    #[test]
    fn test_newton_leipnik_mixture_covers_all_regions() {
        let pool = ParticlePool::new(
            4000,
            SeedStrategy::default_for(FamilyId::NewtonLeipnik),
            Some(42),
        )
        .unwrap();

        let near_origin = pool.particles().iter().filter(|p| p.max_abs() <= 0.05).count();
        let wide = pool.particles().iter().filter(|p| p.max_abs() > 0.3).count();
        let basin = pool
            .particles()
            .iter()
            .filter(|p| (p.x - 0.349).abs() < 0.05 && (p.z + 0.16).abs() < 0.05)
            .count();

        // Region weights are 40/40/20; thresholds are well below the expected counts.
        assert!(near_origin > 400, "near-origin share too small: {near_origin}");
        assert!(wide > 300, "exploration share too small: {wide}");
        assert!(basin > 500, "basin share too small: {basin}");
    }

    #[test]
    fn test_zero_weight_region_never_chosen() {
        let strategy = SeedStrategy::Mixture {
            regions: vec![
                SeedRegion {
                    weight: 0.0,
                    shape: SeedShape::Cube {
                        center: [100.0, 100.0, 100.0],
                        half_extent: 0.0,
                    },
                },
                SeedRegion {
                    weight: 1.0,
                    shape: SeedShape::Cube {
                        center: [0.0; 3],
                        half_extent: 0.5,
                    },
                },
            ],
        };
        let pool = ParticlePool::new(200, strategy, Some(5)).unwrap();
        assert!(pool.particles().iter().all(|p| p.max_abs() <= 0.5));
    }

    #[test]
    fn test_invalid_strategy_rejected() {
        let result = ParticlePool::new(10, SeedStrategy::Mixture { regions: vec![] }, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_overflowing_weights_rejected_before_sampling() {
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
        assert!(matches!(
            ParticlePool::new(4, strategy, Some(1)),
            Err(SeedError::WeightOverflow)
        ));
    }

    #[test]
    #[should_panic]
    fn test_reseed_out_of_range_panics() {
        let mut pool = ParticlePool::new(4, SeedStrategy::origin_cube(1.0), Some(1)).unwrap();
        pool.reseed(4);
    }
}
