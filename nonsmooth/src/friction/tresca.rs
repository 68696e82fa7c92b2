use super::check_dimension;
use super::error::compute_error;
use super::local::make_local_solver;
use super::nsgs::{nsgs, NsgsParams};
use crate::{
    Error, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions, Status,
    IPARAM_INTERNAL_TOLERANCE_POLICY,
};

/// How the tolerance of the inner Tresca solves evolves across outer iterations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InternalTolerancePolicy {
    /// Use the tolerance of the internal configuration as is.
    Fixed,
    /// Tighten the inner tolerance to a tenth of the current outer error.
    Adaptive,
}

impl From<i32> for InternalTolerancePolicy {
    fn from(v: i32) -> Self {
        if v == 1 {
            InternalTolerancePolicy::Adaptive
        } else {
            InternalTolerancePolicy::Fixed
        }
    }
}

/// Solves a Coulomb friction problem as a sequence of Tresca problems.
///
/// The friction thresholds of each Tresca problem are `s_c = μ_c max(r_N,c, 0)` computed from
/// the previous reactions. Each Tresca problem is solved by the configured internal NSGS
/// with cylinder projections.
pub fn tresca_fixed_point(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    options: &SolverOptions,
) -> Result<Outcome, Error> {
    let inner_options = options.internal_solver()?;
    let local = make_local_solver(inner_options.internal_solver()?)?;
    let mut inner = NsgsParams::from(inner_options);
    let policy = InternalTolerancePolicy::from(options.iparam[IPARAM_INTERNAL_TOLERANCE_POLICY]);

    let max_iter = options.max_iter();
    let tolerance = options.tolerance();
    let verbose = options.verbose;

    let mut thresholds = vec![0.0; problem.number_of_contacts()];
    let mut iterations = 0;
    let mut inner_iterations = 0;
    let mut err = f64::INFINITY;

    while iterations < max_iter && err > tolerance {
        iterations += 1;

        for ((s, &mu), r) in thresholds
            .iter_mut()
            .zip(problem.mu().iter())
            .zip(reaction.chunks_exact(3))
        {
            *s = mu * r[0].max(0.0);
        }
        if policy == InternalTolerancePolicy::Adaptive && err.is_finite() {
            inner.tolerance = (0.1 * err).max(0.1 * tolerance);
        }

        let outcome = nsgs(
            problem,
            reaction,
            velocity,
            &inner,
            local.as_ref(),
            Some(&thresholds),
        );
        inner_iterations += outcome.iterations;
        if outcome.status == Status::DegenerateInput {
            return Ok(Outcome {
                status: Status::DegenerateInput,
                iterations,
                residual: 0.0,
            });
        }

        err = compute_error(problem, reaction, velocity);
        if verbose > 1 {
            log::debug!(
                "TFP iteration {}: error = {:e} ({} inner iterations)",
                iterations,
                err,
                outcome.iterations
            );
        }
    }

    let status = Status::from_error(err, tolerance);
    if verbose > 0 {
        log::info!(
            "TFP: {:?} after {} iterations ({} inner), error = {:e}",
            status,
            iterations,
            inner_iterations,
            err
        );
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }
    Ok(Outcome {
        status,
        iterations,
        residual: if err.is_finite() { err } else { 0.0 },
    })
}

#[derive(Copy, Clone, Debug, Default)]
pub struct TrescaFixedPointSolver;

impl Solver<FrictionContactProblem> for TrescaFixedPointSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dTrescaFixedPoint
    }

    fn check_problem(&self, problem: &FrictionContactProblem) -> Result<(), Error> {
        check_dimension(self.id(), problem, 3)
    }

    fn solve(
        &self,
        problem: &FrictionContactProblem,
        reaction: &mut [f64],
        velocity: &mut [f64],
        options: &SolverOptions,
    ) -> Result<Outcome, Error> {
        tresca_fixed_point(problem, reaction, velocity, options)
    }
}
