//! Core math modules.

pub mod moments;
pub mod poisson;
pub mod stable;
