pub mod norm;
pub mod zip;

/**
 * This crate provides various convenience functions and utilities shared by the solvers.
 */
pub use crate::norm::*;
pub use crate::zip::*;
