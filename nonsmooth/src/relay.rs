//! Solvers for box constrained ("dual relay") problems.
//!
//! The reaction vector holds `z` and the velocity vector holds `w = M z - q`.

mod latin;
mod pgs;

pub use latin::*;
pub use pgs::*;

use crate::{RelayProblem, Solver};

/// Diagonal entries at or below this magnitude are treated as zero.
pub const DIAGONAL_THRESHOLD: f64 = 1e-16;

/// All solvers for relay problems.
pub fn solvers() -> Vec<Box<dyn Solver<RelayProblem>>> {
    vec![Box::new(PgsSolver), Box::new(LatinSolver)]
}

/// Projects `x` onto the interval `[-b, a]`.
#[inline]
pub(crate) fn project_on_box(x: f64, a: f64, b: f64) -> f64 {
    x.min(a).max(-b)
}
