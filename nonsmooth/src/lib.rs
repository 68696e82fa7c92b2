//! Solvers for nonsmooth contact and complementarity problems.
//!
//! A problem is fully assembled by the caller (see [`FrictionContactProblem`] and
//! [`RelayProblem`]) and handed to a [`Driver`] together with a [`SolverOptions`] tree that
//! selects one of the registered algorithms. The driver returns a [`SolveResult`] carrying
//! the reaction and velocity vectors along with a numeric [`Status`]. Configuration and
//! integration mistakes are reported through [`Error`] instead.

mod driver;
pub mod friction;
pub mod io;
pub mod linalg;
mod options;
mod problem;
pub mod relay;
mod solver;

pub mod test_utils;

pub use driver::*;
pub use options::*;
pub use problem::*;
pub use solver::*;

use thiserror::Error;

/// Fatal errors.
///
/// These indicate a mismatch between the caller and the engine (a bad identifier, a problem of
/// the wrong shape or an ill-formed configuration tree). Numerical failures are never reported
/// here; they are part of the [`Status`] of a [`SolveResult`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("Size mismatch: {what} (expected {expected}, got {actual})")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid problem: {reason}")]
    InvalidProblem { reason: String },
    #[error("Unknown solver identifier: {id:?}")]
    UnknownSolver { id: String },
    #[error("Solver {id} is not registered for {family:?} problems")]
    UnregisteredSolver { id: SolverId, family: Family },
    #[error("Problem dimension {dimension} is not supported by {id}")]
    UnsupportedDimension { id: SolverId, dimension: usize },
    #[error("Invalid solver configuration for {id}: {reason}")]
    InvalidConfiguration { id: SolverId, reason: String },
    #[error("Failed to load solver configuration")]
    LoadConfig {
        #[from]
        source: io::LoadConfigError,
    },
}
