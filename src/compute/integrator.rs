//! Integrator - advances every particle in a pool by one time step.
//!
//! Divergence is repaired locally: a particle whose next state is non-finite
//! or outside the family's bound is reseeded in place, and the rest of the
//! pool is unaffected.

use serde::Serialize;

use super::{FamilyProfile, ParticlePool, ParticleState, derivative, step_with};
use crate::schema::{AttractorParameters, IntegrationMethod, SimulationConfig, StepMode};

/// Why a particle was rejected after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Divergence {
    /// At least one coordinate is NaN or infinite.
    NonFinite,
    /// At least one coordinate exceeds the family's divergence bound.
    OutOfBounds,
}

/// Classify a candidate state against a divergence bound.
#[inline]
pub fn classify(state: &ParticleState, bound: f32) -> Option<Divergence> {
    if !state.is_finite() {
        Some(Divergence::NonFinite)
    } else if state.max_abs() > bound {
        Some(Divergence::OutOfBounds)
    } else {
        None
    }
}

/// Outcome of one integration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Particles reseeded during this pass.
    pub reseeded: usize,
    /// Reseeds caused by non-finite coordinates.
    pub non_finite: usize,
    /// Reseeds caused by leaving the divergence bound.
    pub out_of_bounds: usize,
    /// Largest substep count used for any particle.
    pub max_substeps: u32,
}

impl StepReport {
    fn record(&mut self, divergence: Divergence) {
        self.reseeded += 1;
        match divergence {
            Divergence::NonFinite => self.non_finite += 1,
            Divergence::OutOfBounds => self.out_of_bounds += 1,
        }
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: &StepReport) {
        self.reseeded += other.reseeded;
        self.non_finite += other.non_finite;
        self.out_of_bounds += other.out_of_bounds;
        self.max_substeps = self.max_substeps.max(other.max_substeps);
    }
}

/// Fixed-step integrator bound to one family's coefficients.
#[derive(Debug, Clone)]
pub struct Integrator {
    params: AttractorParameters,
    base_step: f32,
    divergence_bound: f32,
    speed: f32,
    method: IntegrationMethod,
    mode: StepMode,
}

impl Integrator {
    /// Create an integrator for a family profile and session config.
    pub fn new(
        params: AttractorParameters,
        profile: &FamilyProfile,
        config: &SimulationConfig,
    ) -> Self {
        Self {
            params,
            base_step: profile.base_step,
            divergence_bound: profile.divergence_bound,
            speed: config.integration_speed,
            method: config.method,
            mode: config.step_mode,
        }
    }

    /// Replace coefficients wholesale; used from the next step on.
    pub fn set_parameters(&mut self, params: AttractorParameters) {
        debug_assert_eq!(params.family(), self.params.family());
        self.params = params;
    }

    /// Pick up speed, method and step mode from a new config.
    pub fn apply_config(&mut self, config: &SimulationConfig) {
        self.speed = config.integration_speed;
        self.method = config.method;
        self.mode = config.step_mode;
    }

    pub fn parameters(&self) -> &AttractorParameters {
        &self.params
    }

    pub fn divergence_bound(&self) -> f32 {
        self.divergence_bound
    }

    /// Effective step size: base step times speed multiplier.
    #[inline]
    pub fn dt(&self) -> f32 {
        self.base_step * self.speed
    }

    /// Advance one state; also returns the substep count used.
    fn advance(&self, state: ParticleState) -> (ParticleState, u32) {
        let dt = self.dt();
        match self.mode {
            StepMode::Fixed => (step_with(state, &self.params, dt, self.method), 1),
            StepMode::Adaptive {
                max_displacement,
                max_substeps,
            } => {
                let velocity = derivative(state, &self.params).norm();
                let estimate = (velocity * dt / max_displacement).ceil();
                let substeps = if estimate.is_finite() {
                    (estimate as u32).clamp(1, max_substeps.max(1))
                } else {
                    max_substeps.max(1)
                };

                let h = dt / substeps as f32;
                let mut next = state;
                for _ in 0..substeps {
                    next = step_with(next, &self.params, h, self.method);
                    if !next.is_finite() {
                        break;
                    }
                }
                (next, substeps)
            }
        }
    }

    /// Advance every slot of the pool by one step.
    pub fn step(&self, pool: &mut ParticlePool) -> StepReport {
        let mut report = StepReport::default();

        for i in 0..pool.len() {
            let current = pool.particles()[i];
            let (next, substeps) = self.advance(current);
            report.max_substeps = report.max_substeps.max(substeps);

            match classify(&next, self.divergence_bound) {
                None => pool.set(i, next),
                Some(divergence) => {
                    report.record(divergence);
                    pool.reseed(i);
                }
            }
        }

        if report.reseeded > 0 {
            log::debug!(
                "Reseeded {} of {} particles ({} non-finite, {} out of bounds)",
                report.reseeded,
                pool.len(),
                report.non_finite,
                report.out_of_bounds
            );
        }

        report
    }

    /// Run several steps, accumulating the reports.
    pub fn run(&self, pool: &mut ParticlePool, steps: u64) -> StepReport {
        let mut total = StepReport::default();
        for _ in 0..steps {
            total.merge(&self.step(pool));
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compute::step;
    use crate::schema::{FamilyId, NewtonLeipnikParams, SeedStrategy};
    use proptest::prelude::*;

    fn setup(family: FamilyId, count: usize, seed: u64) -> (Integrator, ParticlePool) {
        let profile = FamilyProfile::for_family(family);
        let config = SimulationConfig {
            particle_count: count,
            ..Default::default()
        };
        let integrator = Integrator::new(AttractorParameters::defaults(family), &profile, &config);
        let pool = ParticlePool::new(count, profile.seeding.clone(), Some(seed)).unwrap();
        (integrator, pool)
    }

    #[test]
    fn test_dt_is_base_step_times_speed() {
        let profile = FamilyProfile::for_family(FamilyId::Lorenz);
        let config = SimulationConfig {
            integration_speed: 2.5,
            ..Default::default()
        };
        let integrator =
            Integrator::new(AttractorParameters::defaults(FamilyId::Lorenz), &profile, &config);
        assert!((integrator.dt() - 0.025).abs() < 1e-7);
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify(&ParticleState::new(1.0, 2.0, -2.9), 3.0), None);
        assert_eq!(
            classify(&ParticleState::new(0.0, 3.1, 0.0), 3.0),
            Some(Divergence::OutOfBounds)
        );
        assert_eq!(
            classify(&ParticleState::new(f32::INFINITY, 0.0, 0.0), 3.0),
            Some(Divergence::NonFinite)
        );
    }

    #[test]
    fn test_reseed_locality() {
        let (integrator, mut pool) = setup(FamilyId::Lorenz, 100, 11);
        pool.set(42, ParticleState::new(f32::NAN, 1.0, 1.0));
        let before = pool.particles().to_vec();

        let report = integrator.step(&mut pool);

        assert_eq!(report.reseeded, 1);
        assert_eq!(report.non_finite, 1);
        assert!(pool.get(42).unwrap().is_finite());
        for (i, prior) in before.iter().enumerate() {
            if i == 42 {
                continue;
            }
            let expected = step(*prior, integrator.parameters(), integrator.dt());
            assert_eq!(pool.particles()[i], expected, "slot {i} lost continuity");
        }
    }

    #[test]
    fn test_out_of_bounds_reseeded() {
        let (integrator, mut pool) = setup(FamilyId::NewtonLeipnik, 10, 2);
        pool.set(3, ParticleState::new(5.0, 0.0, 0.0));
        let report = integrator.step(&mut pool);
        assert!(report.out_of_bounds >= 1);
        assert!(pool.get(3).unwrap().max_abs() <= 3.0);
    }

    #[test]
    fn test_lorenz_classic_stays_bounded() {
        let (integrator, mut pool) = setup(FamilyId::Lorenz, 200, 5);
        let mut report = StepReport::default();
        for _ in 0..5000 {
            report.merge(&integrator.step(&mut pool));
            for p in pool.particles() {
                assert!(p.norm() < 100.0, "Lorenz trajectory escaped: {p:?}");
            }
        }
        assert_eq!(report.reseeded, 0);
    }

    #[test]
    fn test_newton_leipnik_classic_stays_bounded() {
        let (integrator, mut pool) = setup(FamilyId::NewtonLeipnik, 200, 6);
        assert_eq!(
            integrator.parameters(),
            &AttractorParameters::NewtonLeipnik(NewtonLeipnikParams { a: 0.4, b: 0.175 })
        );
        let report = integrator.run(&mut pool, 5000);
        assert_eq!(report.reseeded, 0);
        for p in pool.particles() {
            assert!(p.max_abs() < 1.0, "Newton-Leipnik trajectory escaped: {p:?}");
        }
    }

    #[test]
    fn test_adaptive_mode_subdivides_fast_particles() {
        let profile = FamilyProfile::for_family(FamilyId::Lorenz);
        let config = SimulationConfig {
            integration_speed: 5.0,
            step_mode: StepMode::Adaptive {
                max_displacement: 0.1,
                max_substeps: 16,
            },
            ..Default::default()
        };
        let integrator =
            Integrator::new(AttractorParameters::defaults(FamilyId::Lorenz), &profile, &config);
        let mut pool = ParticlePool::new(
            1,
            SeedStrategy::UniformCube {
                center: [10.0, 10.0, 20.0],
                half_extent: 0.0,
            },
            Some(1),
        )
        .unwrap();

        let report = integrator.step(&mut pool);
        assert!(report.max_substeps > 1);
        assert!(report.max_substeps <= 16);
        assert!(pool.get(0).unwrap().is_finite());
    }

    #[test]
    fn test_rk4_method_runs_bounded() {
        let profile = FamilyProfile::for_family(FamilyId::Halvorsen);
        let config = SimulationConfig {
            method: IntegrationMethod::Rk4,
            ..Default::default()
        };
        let integrator =
            Integrator::new(AttractorParameters::defaults(FamilyId::Halvorsen), &profile, &config);
        let mut pool = ParticlePool::new(64, profile.seeding.clone(), Some(8)).unwrap();
        integrator.run(&mut pool, 1000);
        assert!(pool.particles().iter().all(|p| p.is_finite()));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(5))]

        #[test]
        fn prop_every_family_stays_finite(family_index in 0usize..5, seed in any::<u64>()) {
            let family = FamilyId::ALL[family_index];
            let (integrator, mut pool) = setup(family, 16, seed);
            for _ in 0..10_000 {
                integrator.step(&mut pool);
                for p in pool.particles() {
                    prop_assert!(p.is_finite());
                    prop_assert!(p.max_abs() <= integrator.divergence_bound());
                }
            }
        }
    }
}
