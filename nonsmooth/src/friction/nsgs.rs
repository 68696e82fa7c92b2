use super::check_dimension;
use super::error::{compute_error, compute_tresca_error};
use super::local::{make_local_solver, LocalProblem, LocalSolver};
use crate::{
    Error, ErrorEvaluation, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions,
    Status, DPARAM_RELAXATION, IPARAM_ERROR_EVALUATION,
};

/// Parameters of the nonsmooth Gauss-Seidel method.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NsgsParams {
    pub max_iter: u32,
    pub tolerance: f64,
    /// Relaxation `ω` applied to each contact update.
    pub relaxation: f64,
    pub error_evaluation: ErrorEvaluation,
    pub verbose: u8,
}

impl From<&SolverOptions> for NsgsParams {
    fn from(options: &SolverOptions) -> Self {
        NsgsParams {
            max_iter: options.max_iter(),
            tolerance: options.tolerance(),
            relaxation: options.dparam[DPARAM_RELAXATION],
            error_evaluation: ErrorEvaluation::from(options.iparam[IPARAM_ERROR_EVALUATION]),
            verbose: options.verbose,
        }
    }
}

/// Extracts the sub-problem of contact `c` with all other reactions held fixed.
pub fn local_problem(
    problem: &FrictionContactProblem,
    c: usize,
    reaction: &[f64],
    threshold: Option<f64>,
) -> LocalProblem {
    let m = problem.m();
    let offset = 3 * c;
    let w = m.fixed_view::<3, 3>(offset, offset).into_owned();
    let rc = na::Vector3::from_column_slice(&reaction[offset..offset + 3]);
    let r: na::DVectorView<f64> = reaction.into();

    let mut q = na::Vector3::from_column_slice(&problem.q()[offset..offset + 3]);
    q += m.fixed_rows::<3>(offset) * r;
    q -= w * rc;

    LocalProblem {
        w,
        q,
        mu: problem.mu()[c],
        threshold,
    }
}

/// Nonsmooth Gauss-Seidel sweeps over the contacts of a three dimensional problem.
///
/// `reaction` holds the initial guess on entry. When `thresholds` are given they are passed
/// to the local solver as Tresca thresholds, one per contact.
pub fn nsgs(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    params: &NsgsParams,
    local: &dyn LocalSolver,
    thresholds: Option<&[f64]>,
) -> Outcome {
    let nc = problem.number_of_contacts();
    let omega = params.relaxation;

    let mut iterations = 0;
    let mut err = f64::INFINITY;
    let mut error_is_current = false;

    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        let mut increment = 0.0;

        for c in 0..nc {
            let sub_problem = local_problem(problem, c, reaction, thresholds.map(|s| s[c]));
            let prev = na::Vector3::from_column_slice(&reaction[3 * c..3 * c + 3]);
            let mut r = prev;

            let report = local.solve(&sub_problem, &mut r);
            match report.status {
                Status::DegenerateInput => {
                    log::warn!("NSGS: degenerate sub-problem at contact {}", c);
                    problem.velocity(reaction, velocity);
                    return Outcome {
                        status: Status::DegenerateInput,
                        iterations,
                        residual: 0.0,
                    };
                }
                Status::NotConverged => {
                    log::trace!(
                        "NSGS: {} did not converge at contact {} (error = {:e})",
                        local.id(),
                        c,
                        report.error
                    );
                }
                _ => {}
            }

            let r = r * omega + prev * (1.0 - omega);
            increment += (r - prev).norm_squared();
            reaction[3 * c..3 * c + 3].copy_from_slice(r.as_slice());
        }

        err = match params.error_evaluation {
            ErrorEvaluation::Full => {
                error_is_current = true;
                evaluate_error(problem, reaction, velocity, thresholds)
            }
            ErrorEvaluation::Light => {
                let scale = crate::linalg::nrm2(reaction);
                let light = if scale > 0.0 {
                    increment.sqrt() / scale
                } else {
                    increment.sqrt()
                };
                error_is_current = light <= params.tolerance;
                if error_is_current {
                    evaluate_error(problem, reaction, velocity, thresholds)
                } else {
                    light
                }
            }
        };

        if params.verbose > 1 {
            log::debug!("NSGS iteration {}: error = {:e}", iterations, err);
        }
    }

    if !error_is_current {
        problem.velocity(reaction, velocity);
    }

    let status = Status::from_error(err, params.tolerance);
    if params.verbose > 0 {
        log::info!(
            "NSGS: {:?} after {} iterations, error = {:e}",
            status,
            iterations,
            err
        );
    }
    Outcome {
        status,
        iterations,
        residual: if err.is_finite() { err } else { 0.0 },
    }
}

/// Coulomb error, or Tresca error when thresholds are given.
fn evaluate_error(
    problem: &FrictionContactProblem,
    reaction: &[f64],
    velocity: &mut [f64],
    thresholds: Option<&[f64]>,
) -> f64 {
    match thresholds {
        Some(s) => compute_tresca_error(problem, reaction, velocity, s),
        None => compute_error(problem, reaction, velocity),
    }
}

/// Nonsmooth Gauss-Seidel for three dimensional problems.
#[derive(Copy, Clone, Debug, Default)]
pub struct NsgsSolver;

impl Solver<FrictionContactProblem> for NsgsSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dNsgs
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
        let local = make_local_solver(options.internal_solver()?)?;
        Ok(nsgs(
            problem,
            reaction,
            velocity,
            &NsgsParams::from(options),
            local.as_ref(),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_contact_problem;
    use approx::assert_relative_eq;

    #[test]
    fn local_problem_accounts_for_other_contacts() -> Result<(), Error> {
        let problem = two_contact_problem()?;
        let reaction = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0];
        let local = local_problem(&problem, 0, &reaction, None);
        // Coupling column of the normal component of the second contact.
        assert_relative_eq!(local.q[0], -1.0 + 0.3);
        assert_relative_eq!(local.q[1], 0.4);
        assert_relative_eq!(local.q[2], -0.2 + 0.05);
        assert_eq!(local.mu, 0.3);
        assert_eq!(local.w[(0, 0)], 1.5);
        Ok(())
    }

    #[test]
    fn local_problem_excludes_own_reaction() -> Result<(), Error> {
        let problem = two_contact_problem()?;
        let reaction = [2.0, 1.0, -1.0, 0.0, 0.0, 0.0];
        let local = local_problem(&problem, 0, &reaction, Some(0.5));
        for i in 0..3 {
            assert_relative_eq!(local.q[i], problem.q()[i], epsilon = 1e-14);
        }
        assert_eq!(local.threshold, Some(0.5));
        Ok(())
    }
}
