//! Simulation scheduler - frame-driven lifecycle for one attractor session.
//!
//! The host calls [`SimulationScheduler::on_frame`] once per display refresh.
//! Each call runs one integration pass followed by one frame buffer update.
//! Cancellation is cooperative: [`SimulationScheduler::stop`] (or the shared
//! cancel handle) clears a flag that is checked at the top of every frame, so
//! an in-flight frame always completes before the pool can be torn down.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use super::{
    FamilyProfile, FrameBuffer, FrameBufferAdapter, Integrator, ParticlePool, PoolStats,
    RenderMode, ShadingProgram, ShadingUniforms, StepReport,
};
use crate::schema::{
    AttractorParameters, BoundControls, ControlBinding, ControlMap, ControlValue, FamilyId,
    PlatformBudget, SeedError, SimulationConfig, UnknownFamily, keys,
};

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Stopped,
    Running,
}

/// Errors surfaced by [`SimulationScheduler::start`].
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error(transparent)]
    UnknownFamily(#[from] UnknownFamily),
    #[error("Invalid seeding strategy in family profile: {0}")]
    InvalidSeeding(#[from] SeedError),
}

/// What happened during one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    /// Frame number within the session, starting at 1.
    pub frame: u64,
    /// Seconds since the session started.
    pub elapsed: f32,
    /// Integration outcome.
    pub step: StepReport,
    /// Rendering path used for this frame.
    pub render_mode: RenderMode,
}

/// Creates a fresh shading program for every session.
pub type ShadingFactory = Box<dyn FnMut() -> Box<dyn ShadingProgram>>;

/// Everything owned by one selected pattern.
struct Session {
    family: FamilyId,
    profile: FamilyProfile,
    config: SimulationConfig,
    pool: ParticlePool,
    integrator: Integrator,
    adapter: FrameBufferAdapter,
    elapsed: f32,
    frames: u64,
    rotation: f32,
    total: StepReport,
}

impl Session {
    fn new(
        family: FamilyId,
        profile: FamilyProfile,
        bound: BoundControls,
        program: Option<Box<dyn ShadingProgram>>,
    ) -> Result<Self, SeedError> {
        let BoundControls { config, params } = bound;
        let pool = ParticlePool::new(
            config.particle_count,
            profile.seeding.clone(),
            config.random_seed,
        )?;
        let integrator = Integrator::new(params, &profile, &config);
        let adapter = FrameBufferAdapter::new(profile.display, program);

        Ok(Self {
            family,
            profile,
            config,
            pool,
            integrator,
            adapter,
            elapsed: 0.0,
            frames: 0,
            rotation: 0.0,
            total: StepReport::default(),
        })
    }
}

/// Drives one integration + buffer update per display refresh.
pub struct SimulationScheduler {
    binding: ControlBinding,
    running: Arc<AtomicBool>,
    controls: ControlMap,
    session: Option<Session>,
    profiles: HashMap<FamilyId, FamilyProfile>,
    shading: Option<ShadingFactory>,
}

impl SimulationScheduler {
    /// Create a stopped scheduler for a platform budget.
    pub fn new(budget: PlatformBudget) -> Self {
        Self {
            binding: ControlBinding::new(budget),
            running: Arc::new(AtomicBool::new(false)),
            controls: ControlMap::new(),
            session: None,
            profiles: HashMap::new(),
            shading: None,
        }
    }

    /// Supply the enhanced shading program used by new sessions.
    pub fn with_shading_program<F>(mut self, factory: F) -> Self
    where
        F: FnMut() -> Box<dyn ShadingProgram> + 'static,
    {
        self.shading = Some(Box::new(factory));
        self
    }

    /// Override a family's tuned constants (step size, divergence bound,
    /// seeding). Takes effect the next time that family is started.
    pub fn set_profile(&mut self, family: FamilyId, profile: FamilyProfile) {
        self.profiles.insert(family, profile);
    }

    /// Profile used for a family, including overrides.
    pub fn profile(&self, family: FamilyId) -> FamilyProfile {
        self.profiles
            .get(&family)
            .cloned()
            .unwrap_or_else(|| FamilyProfile::for_family(family))
    }

    /// Get cancellation handle.
    ///
    /// Clearing the flag stops the scheduler at the top of the next frame.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Select a pattern and start running.
    ///
    /// Any previous session is stopped and discarded before the new pool is
    /// built. On error nothing changes.
    pub fn start(&mut self, family_id: &str, controls: &ControlMap) -> Result<(), SchedulerError> {
        let family: FamilyId = family_id.parse()?;
        let profile = self.profile(family);
        profile.seeding.validate()?;
        let bound = self.binding.bind(family, controls);

        if let Some(old) = self.session.take() {
            self.running.store(false, Ordering::SeqCst);
            log::info!("Discarding {} session after {} frames", old.family, old.frames);
        }

        let program = self.shading.as_mut().map(|factory| factory());
        let session = Session::new(family, profile, bound, program)?;
        log::info!(
            "Started {} with {} particles (dt={})",
            family,
            session.pool.len(),
            session.integrator.dt()
        );

        self.controls = controls.clone();
        self.session = Some(session);
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Stop scheduling frames. Idempotent; the session is kept.
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("Simulation stopped");
        }
    }

    /// Stop and release the pool and any shading resources.
    pub fn teardown(&mut self) {
        self.stop();
        if let Some(session) = self.session.take() {
            log::info!("Tearing down {} session", session.family);
        }
    }

    /// Merge a partial control map and re-bind.
    ///
    /// Coefficient and config changes apply from the next step on. A
    /// particle-count change rebuilds the pool.
    pub fn update_parameters(&mut self, partial: &ControlMap) {
        for (key, value) in partial {
            self.controls.insert(key.clone(), value.clone());
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let bound = self.binding.bind(session.family, &self.controls);
        Self::apply(session, bound);
    }

    /// Change the particle count; returns the count actually used.
    pub fn resize(&mut self, particle_count: usize) -> usize {
        let mut partial = ControlMap::new();
        partial.insert(
            keys::PARTICLE_COUNT.to_string(),
            ControlValue::from(particle_count),
        );
        self.update_parameters(&partial);
        self.session
            .as_ref()
            .map(|s| s.config.particle_count)
            .unwrap_or_else(|| self.binding.clamp_particle_count(particle_count))
    }

    fn apply(session: &mut Session, bound: BoundControls) {
        let BoundControls { config, params } = bound;

        if config.particle_count != session.pool.len() || config.random_seed != session.config.random_seed
        {
            match ParticlePool::new(
                config.particle_count,
                session.profile.seeding.clone(),
                config.random_seed,
            ) {
                Ok(pool) => {
                    log::info!(
                        "Rebuilt {} pool: {} -> {} particles",
                        session.family,
                        session.pool.len(),
                        pool.len()
                    );
                    session.pool = pool;
                }
                // The strategy was validated when the session started.
                Err(e) => log::warn!("Keeping existing pool, reseeding failed: {e}"),
            }
        }

        session.integrator.set_parameters(params);
        session.integrator.apply_config(&config);
        session.config = config;
    }

    /// Display-refresh callback.
    ///
    /// `frame_dt` is the wall time since the previous refresh in seconds.
    /// Returns `None` without touching any state when stopped.
    pub fn on_frame(&mut self, frame_dt: f32) -> Option<FrameReport> {
        if !self.running.load(Ordering::SeqCst) {
            return None;
        }
        let session = self.session.as_mut()?;

        let frame_dt = if frame_dt.is_finite() {
            frame_dt.max(0.0)
        } else {
            0.0
        };

        let step = session.integrator.step(&mut session.pool);
        session.elapsed += frame_dt;
        session.frames += 1;
        session.total.merge(&step);
        if session.config.auto_rotate {
            session.rotation = (session.rotation + session.config.auto_rotate_speed * frame_dt)
                .rem_euclid(std::f32::consts::TAU);
        }
        session
            .adapter
            .update(&session.pool, &session.config, session.elapsed);

        Some(FrameReport {
            frame: session.frames,
            elapsed: session.elapsed,
            step,
            render_mode: session.adapter.mode(),
        })
    }

    /// Run up to `frames` scheduled frames; stops early if cancelled.
    pub fn run_frames(&mut self, frames: u64, frame_dt: f32) -> StepReport {
        let mut total = StepReport::default();
        for _ in 0..frames {
            match self.on_frame(frame_dt) {
                Some(report) => total.merge(&report.step),
                None => break,
            }
        }
        total
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) && self.session.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Family of the current session.
    pub fn family(&self) -> Option<FamilyId> {
        self.session.as_ref().map(|s| s.family)
    }

    pub fn config(&self) -> Option<&SimulationConfig> {
        self.session.as_ref().map(|s| &s.config)
    }

    pub fn parameters(&self) -> Option<&AttractorParameters> {
        self.session.as_ref().map(|s| s.integrator.parameters())
    }

    pub fn pool(&self) -> Option<&ParticlePool> {
        self.session.as_ref().map(|s| &s.pool)
    }

    /// Buffer written by the last frame.
    pub fn frame_buffer(&self) -> Option<&FrameBuffer> {
        self.session.as_ref().map(|s| s.adapter.buffer())
    }

    pub fn uniforms(&self) -> Option<&ShadingUniforms> {
        self.session.as_ref().and_then(|s| s.adapter.uniforms())
    }

    pub fn render_mode(&self) -> Option<RenderMode> {
        self.session.as_ref().map(|s| s.adapter.mode())
    }

    /// Current auto-rotation angle in radians.
    pub fn rotation(&self) -> f32 {
        self.session.as_ref().map_or(0.0, |s| s.rotation)
    }

    pub fn elapsed(&self) -> f32 {
        self.session.as_ref().map_or(0.0, |s| s.elapsed)
    }

    pub fn frame_count(&self) -> u64 {
        self.session.as_ref().map_or(0, |s| s.frames)
    }

    /// Divergence totals since the session started.
    pub fn total_report(&self) -> StepReport {
        self.session.as_ref().map(|s| s.total).unwrap_or_default()
    }

    pub fn stats(&self) -> Option<PoolStats> {
        self.session.as_ref().map(|s| PoolStats::from_pool(&s.pool))
    }
}

impl Drop for SimulationScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}
