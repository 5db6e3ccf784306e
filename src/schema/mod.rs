//! Schema module - Configuration, coefficient and seeding types for attractor simulations.

mod attractor;
mod config;
mod controls;
mod seed;

pub use attractor::*;
pub use config::*;
pub use controls::*;
pub use seed::*;
