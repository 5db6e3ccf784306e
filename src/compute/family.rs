//! Equation families - pure step functions for each chaotic attractor.
//!
//! Every family maps a 3D state and its coefficients to a time derivative.
//! A single dispatcher over [`AttractorParameters`] keeps the numeric code
//! monomorphic; no family holds state of its own.

use crate::schema::{
    AizawaParams, AttractorParameters, FamilyId, HalvorsenParams, IntegrationMethod, LorenzParams,
    NewtonLeipnikParams, SeedStrategy, ThomasParams,
};

/// Position of a single particle.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl ParticleState {
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// All three coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Largest absolute coordinate.
    #[inline]
    pub fn max_abs(&self) -> f32 {
        self.x.abs().max(self.y.abs()).max(self.z.abs())
    }

    /// Euclidean norm.
    #[inline]
    pub fn norm(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    fn offset(self, d: ParticleState, h: f32) -> Self {
        Self::new(self.x + d.x * h, self.y + d.y * h, self.z + d.z * h)
    }
}

#[inline]
fn lorenz(p: ParticleState, c: &LorenzParams) -> ParticleState {
    ParticleState::new(
        c.sigma * (p.y - p.x),
        p.x * (c.rho - p.z) - p.y,
        p.x * p.y - c.beta * p.z,
    )
}

#[inline]
fn thomas(p: ParticleState, c: &ThomasParams) -> ParticleState {
    ParticleState::new(
        p.y.sin() - c.b * p.x,
        p.z.sin() - c.b * p.y,
        p.x.sin() - c.b * p.z,
    )
}

#[inline]
fn aizawa(p: ParticleState, c: &AizawaParams) -> ParticleState {
    let zb = p.z - c.b;
    ParticleState::new(
        zb * p.x - c.d * p.y,
        c.d * p.x + zb * p.y,
        c.c + c.a * p.z - p.z * p.z * p.z / 3.0 - (p.x * p.x + p.y * p.y) * (1.0 + c.e * p.z)
            + c.f * p.z * p.x * p.x * p.x,
    )
}

#[inline]
fn halvorsen(p: ParticleState, c: &HalvorsenParams) -> ParticleState {
    ParticleState::new(
        -c.a * p.x - 4.0 * p.y - 4.0 * p.z - p.y * p.y,
        -c.a * p.y - 4.0 * p.z - 4.0 * p.x - p.z * p.z,
        -c.a * p.z - 4.0 * p.x - 4.0 * p.y - p.x * p.x,
    )
}

#[inline]
fn newton_leipnik(p: ParticleState, c: &NewtonLeipnikParams) -> ParticleState {
    ParticleState::new(
        -c.a * p.x + p.y + 10.0 * p.y * p.z,
        -p.x - 0.4 * p.y + 5.0 * p.x * p.z,
        c.b * p.z - 5.0 * p.x * p.y,
    )
}

/// Time derivative of `state` under the given family.
#[inline]
pub fn derivative(state: ParticleState, params: &AttractorParameters) -> ParticleState {
    match params {
        AttractorParameters::Lorenz(c) => lorenz(state, c),
        AttractorParameters::Thomas(c) => thomas(state, c),
        AttractorParameters::Aizawa(c) => aizawa(state, c),
        AttractorParameters::Halvorsen(c) => halvorsen(state, c),
        AttractorParameters::NewtonLeipnik(c) => newton_leipnik(state, c),
    }
}

/// Advance `state` by one forward-Euler step of size `dt`.
#[inline]
pub fn step(state: ParticleState, params: &AttractorParameters, dt: f32) -> ParticleState {
    state.offset(derivative(state, params), dt)
}

/// Advance `state` by one classic fourth-order Runge-Kutta step.
#[inline]
pub fn step_rk4(state: ParticleState, params: &AttractorParameters, dt: f32) -> ParticleState {
    let k1 = derivative(state, params);
    let k2 = derivative(state.offset(k1, dt * 0.5), params);
    let k3 = derivative(state.offset(k2, dt * 0.5), params);
    let k4 = derivative(state.offset(k3, dt), params);
    let sixth = dt / 6.0;
    ParticleState::new(
        state.x + sixth * (k1.x + 2.0 * k2.x + 2.0 * k3.x + k4.x),
        state.y + sixth * (k1.y + 2.0 * k2.y + 2.0 * k3.y + k4.y),
        state.z + sixth * (k1.z + 2.0 * k2.z + 2.0 * k3.z + k4.z),
    )
}

/// Advance `state` using the chosen integration method.
#[inline]
pub fn step_with(
    state: ParticleState,
    params: &AttractorParameters,
    dt: f32,
    method: IntegrationMethod,
) -> ParticleState {
    match method {
        IntegrationMethod::Euler => step(state, params, dt),
        IntegrationMethod::Rk4 => step_rk4(state, params, dt),
    }
}

/// Maps simulation space into the renderer's normalized viewing volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayTransform {
    /// Simulation-space point placed at the origin of the view.
    pub center: ParticleState,
    /// Uniform scale applied after centring.
    pub scale: f32,
}

impl DisplayTransform {
    #[inline]
    pub fn apply(&self, p: ParticleState) -> [f32; 3] {
        [
            (p.x - self.center.x) * self.scale,
            (p.y - self.center.y) * self.scale,
            (p.z - self.center.z) * self.scale,
        ]
    }
}

/// Numerical and display constants tuned for one family.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyProfile {
    /// Step size at speed 1.0, chosen for the family's stiffness.
    pub base_step: f32,
    /// A particle whose |coordinate| exceeds this is reseeded.
    pub divergence_bound: f32,
    /// Display centring and scale.
    pub display: DisplayTransform,
    /// How fresh particles are drawn.
    pub seeding: SeedStrategy,
}

impl FamilyProfile {
    /// Documented profile for a family.
    pub fn for_family(family: FamilyId) -> Self {
        let (base_step, divergence_bound, center, scale) = match family {
            FamilyId::Lorenz => (0.01, 200.0, ParticleState::new(0.0, 0.0, 25.0), 0.04),
            FamilyId::Thomas => (0.05, 30.0, ParticleState::default(), 0.25),
            FamilyId::Aizawa => (0.01, 10.0, ParticleState::new(0.0, 0.0, 0.5), 0.8),
            FamilyId::Halvorsen => (0.005, 50.0, ParticleState::new(-2.0, -2.0, -2.0), 0.1),
            FamilyId::NewtonLeipnik => (0.001, 3.0, ParticleState::default(), 2.0),
        };

        Self {
            base_step,
            divergence_bound,
            display: DisplayTransform { center, scale },
            seeding: SeedStrategy::default_for(family),
        }
    }
}
