use serde::{Deserialize, Serialize};

use crate::linalg;
use crate::{Error, SolverId, SolverOptions};

/// Numerical outcome of a solve.
///
/// The discriminants are stable status codes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i32)]
pub enum Status {
    /// The residual dropped to or below the requested tolerance.
    Converged = 0,
    /// The iteration cap was reached. The outputs hold the last iterate.
    NotConverged = 1,
    /// A required matrix factorization failed.
    FactorizationFailed = 2,
    /// The input is numerically degenerate (e.g. a vanishing diagonal entry).
    DegenerateInput = 3,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn is_converged(self) -> bool {
        self == Status::Converged
    }

    /// Classifies the final error against a tolerance.
    pub(crate) fn from_error(error: f64, tolerance: f64) -> Status {
        if error <= tolerance {
            Status::Converged
        } else {
            Status::NotConverged
        }
    }
}

impl From<linalg::Error> for Status {
    fn from(err: linalg::Error) -> Status {
        match err {
            linalg::Error::NotPositiveDefinite => Status::FactorizationFailed,
            linalg::Error::SingularMatrix => Status::DegenerateInput,
        }
    }
}

/// Summary of a single algorithm run, without the solution vectors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Outcome {
    pub status: Status,
    /// Number of iterations performed.
    pub iterations: u32,
    /// Last evaluated error.
    pub residual: f64,
}

impl Outcome {
    /// An outcome for runs aborted before the first iteration.
    pub(crate) fn aborted(status: Status) -> Outcome {
        Outcome {
            status,
            iterations: 0,
            residual: 0.0,
        }
    }
}

/// The solution returned to callers of the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct SolveResult {
    pub reaction: Vec<f64>,
    pub velocity: Vec<f64>,
    pub status: Status,
    pub iterations: u32,
    pub residual: f64,
}

impl std::fmt::Display for SolveResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Status: {:?}\nIterations: {}\nResidual: {:e}",
            self.status, self.iterations, self.residual
        )
    }
}

/// An algorithm for problems of type `P`.
///
/// Implementations receive zero initialized output buffers of the problem size and
/// configuration trees that have already been filled with defaults and validated.
pub trait Solver<P>: Send + Sync {
    /// The identifier this algorithm is registered under.
    fn id(&self) -> SolverId;

    /// Rejects problems this algorithm cannot handle.
    fn check_problem(&self, _problem: &P) -> Result<(), Error> {
        Ok(())
    }

    /// Runs the algorithm, writing the solution into `reaction` and `velocity`.
    fn solve(
        &self,
        problem: &P,
        reaction: &mut [f64],
        velocity: &mut [f64],
        options: &SolverOptions,
    ) -> Result<Outcome, Error>;
}
