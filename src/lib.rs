//! Strange Attractors - Particle simulation of chaotic 3D flows.
//!
//! This crate animates thousands of independent particles along the
//! trajectories of five classic strange attractors (Lorenz, Thomas, Aizawa,
//! Halvorsen and Newton-Leipnik). Particles that diverge are reseeded in
//! place so the pool keeps a stable size and slot order, and every frame is
//! flattened into a buffer a point renderer can upload directly.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Families, coefficients, seeding strategies and control binding
//! - `compute`: Integration, particle pool, frame buffer and scheduling
//!
//! # Example
//!
//! ```rust,no_run
//! use strange_attractors::{
//!     compute::SimulationScheduler,
//!     schema::{ControlMap, PlatformBudget},
//! };
//!
//! let mut scheduler = SimulationScheduler::new(PlatformBudget::desktop());
//! scheduler.start("lorenz", &ControlMap::new()).unwrap();
//!
//! // One call per display refresh.
//! for _ in 0..100 {
//!     scheduler.on_frame(1.0 / 60.0);
//! }
//!
//! let buffer = scheduler.frame_buffer().unwrap();
//! println!("{} particles ready to draw", buffer.particle_count());
//! ```

pub mod compute;
pub mod schema;

// WebAssembly bindings (only for wasm32 target)
#[cfg(target_arch = "wasm32")]
pub mod wasm;

// Re-export commonly used types
pub use compute::{FrameBuffer, ParticlePool, PoolStats, SimulationScheduler};
pub use schema::{AttractorParameters, ControlMap, FamilyId, SimulationConfig};
