use super::check_dimension;
use super::error::compute_error;
use super::nsgs::NsgsParams;
use super::projection::project_on_cone;
use crate::relay::DIAGONAL_THRESHOLD;
use crate::{Error, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions, Status};

/// Nonsmooth Gauss-Seidel sweeps over the contacts of a two dimensional problem.
///
/// Each contact takes one projection step `r_c ← Π_K(r_c - (u_c + μ|u_T| e_N) / W_cc[0, 0])`
/// with the velocity `u_c` including the latest reactions of all other contacts. The error is
/// evaluated after every sweep.
pub fn fc2d_nsgs(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    params: &NsgsParams,
) -> Outcome {
    let m = problem.m();
    let q = problem.q();
    let nc = problem.number_of_contacts();

    if let Some(c) = (0..nc).find(|&c| m[(2 * c, 2 * c)] <= DIAGONAL_THRESHOLD) {
        log::warn!("F2D NSGS: non-positive diagonal entry at contact {}", c);
        return Outcome::aborted(Status::DegenerateInput);
    }

    let omega = params.relaxation;
    let mut iterations = 0;
    let mut err = f64::INFINITY;

    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        for (c, &mu) in problem.mu().iter().enumerate() {
            let offset = 2 * c;
            let r: na::DVectorView<f64> = (&reaction[..]).into();
            let mut u = na::Vector2::new(q[offset], q[offset + 1]);
            u += m.fixed_rows::<2>(offset) * r;
            u[0] += mu * u[1].abs();

            let rho = 1.0 / m[(offset, offset)];
            let prev = [reaction[offset], reaction[offset + 1]];
            let mut next = [prev[0] - rho * u[0], prev[1] - rho * u[1]];
            project_on_cone(&mut next, mu);
            for (i, (&next, &prev)) in next.iter().zip(prev.iter()).enumerate() {
                reaction[offset + i] = omega * next + (1.0 - omega) * prev;
            }
        }

        err = compute_error(problem, reaction, velocity);
        if params.verbose > 1 {
            log::debug!("F2D NSGS iteration {}: error = {:e}", iterations, err);
        }
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }

    let status = Status::from_error(err, params.tolerance);
    if params.verbose > 0 {
        log::info!(
            "F2D NSGS: {:?} after {} iterations, error = {:e}",
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

/// Nonsmooth Gauss-Seidel for two dimensional problems.
#[derive(Copy, Clone, Debug, Default)]
pub struct Fc2dNsgsSolver;

impl Solver<FrictionContactProblem> for Fc2dNsgsSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc2dNsgs
    }

    fn check_problem(&self, problem: &FrictionContactProblem) -> Result<(), Error> {
        check_dimension(self.id(), problem, 2)
    }

    fn solve(
        &self,
        problem: &FrictionContactProblem,
        reaction: &mut [f64],
        velocity: &mut [f64],
        options: &SolverOptions,
    ) -> Result<Outcome, Error> {
        Ok(fc2d_nsgs(
            problem,
            reaction,
            velocity,
            &NsgsParams::from(options),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::two_dimensional_problem;
    use approx::assert_relative_eq;

    #[test]
    fn two_contacts() -> Result<(), Error> {
        let problem = two_dimensional_problem()?;
        let params = NsgsParams::from(&SolverOptions::new(SolverId::Fc2dNsgs));
        let mut r = vec![0.0; 4];
        let mut u = vec![0.0; 4];
        let outcome = fc2d_nsgs(&problem, &mut r, &mut u, &params);
        assert_eq!(outcome.status, Status::Converged);
        assert_eq!(outcome.iterations, 10);
        // Both contacts slide.
        assert_relative_eq!(r[0], 0.643275, epsilon = 1e-5);
        assert_relative_eq!(r[1], -0.3 * r[0], epsilon = 1e-9);
        assert_relative_eq!(r[2], 0.245613, epsilon = 1e-5);
        assert_relative_eq!(r[3], 0.5 * r[2], epsilon = 1e-9);
        assert_relative_eq!(u[0], 0.0, epsilon = 1e-5);
        assert_relative_eq!(u[3], -0.521053, epsilon = 1e-5);
        Ok(())
    }

    #[test]
    fn rejects_three_dimensional_problems() -> Result<(), Error> {
        let problem = crate::test_utils::single_contact_problem()?;
        assert!(matches!(
            Fc2dNsgsSolver.check_problem(&problem),
            Err(Error::UnsupportedDimension { dimension: 3, .. })
        ));
        Ok(())
    }
}
