use super::error::compute_error;
use super::fixed_point::{
    adaptive_predictor, grow_step, report, ProjectionParams, ProjectionWorkspace,
};
use super::{check_dimension, modified_velocity, projected_step};
use crate::linalg::{dot, nrm2};
use crate::{
    Error, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions, DPARAM_RELAXATION,
};

/// Hyperplane projection method.
///
/// The predictor `r̄ = Π_K(r - ρ F(r))` defines the residual `d = r - r̄` and the direction
/// `D = d - ρ (F(r) - F(r̄))`. The hyperplane orthogonal to `D` through `r - β D`, with
/// `β = ⟨d, D⟩ / ‖D‖²`, separates the current iterate from the solution set. The new iterate
/// steps towards it along `F(r̄)`: `r ← Π_K(r - γ β ρ F(r̄))`, where `γ` is the relaxation.
pub fn hyperplane_projection(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    params: &ProjectionParams,
    relaxation: f64,
) -> Outcome {
    let n = reaction.len();
    let mut ws = ProjectionWorkspace::new(n);
    let mut d = vec![0.0; n];
    let mut dir = vec![0.0; n];
    let mut rho = params.rho;

    let mut iterations = 0;
    let mut err = f64::INFINITY;
    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        ws.r_prev.copy_from_slice(reaction);
        modified_velocity(problem, reaction, &mut ws.f_prev);

        let ratio = adaptive_predictor(problem, &mut ws, &mut rho, params);
        for (d, dir, &r, &r_bar, &f, &f_bar) in utils::zip!(
            d.iter_mut(),
            dir.iter_mut(),
            ws.r_prev.iter(),
            ws.r_bar.iter(),
            ws.f_prev.iter(),
            ws.f_bar.iter()
        ) {
            *d = r - r_bar;
            *dir = *d - rho * (f - f_bar);
        }

        let dir_norm_sq = utils::norm_squared(&dir);
        if nrm2(&d) == 0.0 || dir_norm_sq <= f64::EPSILON * f64::EPSILON {
            // The predictor is a fixed point.
            reaction.copy_from_slice(&ws.r_bar);
        } else {
            let beta = dot(&d, &dir) / dir_norm_sq;
            projected_step(
                problem,
                &ws.r_prev,
                relaxation * beta * rho,
                &ws.f_bar,
                reaction,
            );
        }
        grow_step(&mut rho, ratio, params.tau);

        err = compute_error(problem, reaction, velocity);
        if params.verbose > 1 {
            log::debug!(
                "HP iteration {}: error = {:e}, rho = {:e}",
                iterations,
                err,
                rho
            );
        }
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }
    report("HP", params, iterations, err)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct HyperplaneProjectionSolver;

impl Solver<FrictionContactProblem> for HyperplaneProjectionSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dHyperplaneProjection
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
        Ok(hyperplane_projection(
            problem,
            reaction,
            velocity,
            &ProjectionParams::from(options),
            options.dparam[DPARAM_RELAXATION],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::single_contact_problem;
    use crate::Status;
    use approx::assert_relative_eq;

    #[test]
    fn single_contact() -> Result<(), Error> {
        let problem = single_contact_problem()?;
        let options = SolverOptions::new(SolverId::Fc3dHyperplaneProjection);
        let mut r = vec![0.0; 3];
        let mut u = vec![0.0; 3];
        let outcome = hyperplane_projection(
            &problem,
            &mut r,
            &mut u,
            &ProjectionParams::from(&options),
            1.0,
        );
        assert_eq!(outcome.status, Status::Converged);
        assert_relative_eq!(r[0], 1.0, epsilon = 1e-5);
        assert_relative_eq!(r[1], -0.3, epsilon = 1e-5);
        Ok(())
    }
}
