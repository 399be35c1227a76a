//! Backlog Forecast math utilities.

pub mod math;

pub use math::moments::*;
pub use math::poisson::*;
pub use math::stable::*;
