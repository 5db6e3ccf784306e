//! Compute module - Particle integration, seeding and frame production.

mod family;
mod frame;
mod integrator;
mod pool;
mod scheduler;
mod stats;

pub use family::*;
pub use frame::*;
pub use integrator::*;
pub use pool::*;
pub use scheduler::*;
pub use stats::*;
