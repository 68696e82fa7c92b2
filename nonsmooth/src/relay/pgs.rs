use super::{project_on_box, DIAGONAL_THRESHOLD};
use crate::{
    Error, Outcome, RelayProblem, Solver, SolverId, SolverOptions, Status, DPARAM_RELAXATION,
};

/// Parameters for projected Gauss-Seidel.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PgsParams {
    pub max_iter: u32,
    pub tolerance: f64,
    /// Relaxation factor `ω` applied to each update.
    pub relaxation: f64,
    pub verbose: u8,
}

impl From<&SolverOptions> for PgsParams {
    fn from(options: &SolverOptions) -> Self {
        PgsParams {
            max_iter: options.max_iter(),
            tolerance: options.tolerance(),
            relaxation: options.dparam[DPARAM_RELAXATION],
            verbose: options.verbose,
        }
    }
}

/// Solves a relay problem with projected Gauss-Seidel.
///
/// Each unknown is updated in turn by solving its scalar sub-problem exactly with all other
/// unknowns held fixed.
pub fn pgs(problem: &RelayProblem, z: &mut [f64], w: &mut [f64], params: &PgsParams) -> Outcome {
    let m = problem.m();
    let q = problem.q();
    let (a, b) = (problem.a(), problem.b());
    let n = z.len();

    z.iter_mut().for_each(|x| *x = 0.0);
    w.iter_mut().for_each(|x| *x = 0.0);

    if let Some(i) = (0..n).find(|&i| m[(i, i)] <= DIAGONAL_THRESHOLD) {
        log::warn!("PGS: non-positive diagonal entry at index {}", i);
        return Outcome::aborted(Status::DegenerateInput);
    }

    let omega = params.relaxation;
    let q_norm = crate::linalg::nrm2(q).max(1.0);
    let mut iterations = 0;
    let mut err = f64::INFINITY;

    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        for i in 0..n {
            let m_ii = m[(i, i)];
            // Velocity with the i-th unknown removed.
            let w0 = m.row(i).iter().zip(z.iter()).map(|(&m, &z)| m * z).sum::<f64>()
                - m_ii * z[i]
                - q[i];
            let z_new = (project_on_box(w0, a[i], b[i]) - w0) / m_ii;
            z[i] = omega * z_new + (1.0 - omega) * z[i];
        }

        relay_velocity(problem, z, w);
        err = relay_error(problem, z, w) / q_norm;

        if params.verbose > 1 {
            log::debug!("PGS iteration {}: error = {:e}", iterations, err);
        }
    }

    let status = Status::from_error(err, params.tolerance);
    if params.verbose > 0 {
        log::info!(
            "PGS: {:?} after {} iterations, error = {:e}",
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

/// Computes `w = M z - q`.
pub fn relay_velocity(problem: &RelayProblem, z: &[f64], w: &mut [f64]) {
    w.copy_from_slice(problem.q());
    crate::linalg::scal(-1.0, w);
    crate::linalg::gemv(1.0, problem.m(), z, 1.0, w);
}

/// Natural map residual `‖w - Π(w - z)‖` of a relay problem.
///
/// This is zero exactly when `(z, w)` is a solution.
pub fn relay_error(problem: &RelayProblem, z: &[f64], w: &[f64]) -> f64 {
    utils::zip!(z.iter(), w.iter(), problem.a().iter(), problem.b().iter())
        .map(|(&z, &w, &a, &b)| {
            let r = w - project_on_box(w - z, a, b);
            r * r
        })
        .sum::<f64>()
        .sqrt()
}

/// Projected Gauss-Seidel for relay problems.
#[derive(Copy, Clone, Debug, Default)]
pub struct PgsSolver;

impl Solver<RelayProblem> for PgsSolver {
    fn id(&self) -> SolverId {
        SolverId::RelayPgs
    }

    fn solve(
        &self,
        problem: &RelayProblem,
        reaction: &mut [f64],
        velocity: &mut [f64],
        options: &SolverOptions,
    ) -> Result<Outcome, Error> {
        Ok(pgs(problem, reaction, velocity, &PgsParams::from(options)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params() -> PgsParams {
        PgsParams {
            max_iter: 1000,
            tolerance: 1e-10,
            relaxation: 1.0,
            verbose: 0,
        }
    }

    #[test]
    fn decoupled_box_is_solved_in_one_sweep() -> Result<(), Error> {
        let problem = RelayProblem::new(
            na::DMatrix::identity(2, 2) * 2.0,
            vec![3.0, -3.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )?;
        let mut z = vec![0.0; 2];
        let mut w = vec![0.0; 2];
        let outcome = pgs(&problem, &mut z, &mut w, &params());
        assert_eq!(outcome.status, Status::Converged);
        assert_eq!(outcome.iterations, 1);
        assert_eq!(z, vec![1.0, -1.0]);
        assert_eq!(w, vec![-1.0, 1.0]);
        Ok(())
    }

    #[test]
    fn coupled_problem() -> Result<(), Error> {
        let problem = crate::test_utils::box_relay_problem()?;
        let mut z = vec![0.0; 3];
        let mut w = vec![0.0; 3];
        let outcome = pgs(&problem, &mut z, &mut w, &params());
        assert_eq!(outcome.status, Status::Converged);
        assert_relative_eq!(z[0], 8.0 / 9.0, epsilon = 1e-8);
        assert_relative_eq!(z[1], -37.0 / 18.0, epsilon = 1e-8);
        assert_relative_eq!(z[2], 7.0 / 9.0, epsilon = 1e-8);
        assert_relative_eq!(w[0], -0.5, epsilon = 1e-8);
        assert_relative_eq!(w[1], 0.5, epsilon = 1e-8);
        assert_relative_eq!(w[2], -1.0, epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn zero_diagonal() -> Result<(), Error> {
        let problem = RelayProblem::new(
            na::DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 1.0]),
            vec![3.0, -3.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )?;
        let mut z = vec![0.0; 2];
        let mut w = vec![0.0; 2];
        assert_eq!(
            pgs(&problem, &mut z, &mut w, &params()).status,
            Status::DegenerateInput
        );
        Ok(())
    }
}
