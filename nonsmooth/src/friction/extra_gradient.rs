use super::error::compute_error;
use super::fixed_point::{
    adaptive_predictor, grow_step, report, ProjectionParams, ProjectionWorkspace,
};
use super::{check_dimension, modified_velocity, projected_step};
use crate::{Error, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions};

/// Korpelevich's extra-gradient method.
///
/// Each iteration takes a predictor step `r̄ = Π_K(r - ρ F(r))` followed by the corrector
/// `r ← Π_K(r - ρ F(r̄))`. The step size adapts like in the fixed point projection method.
pub fn extra_gradient(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    params: &ProjectionParams,
) -> Outcome {
    let mut ws = ProjectionWorkspace::new(reaction.len());
    let mut rho = params.rho;
    modified_velocity(problem, reaction, &mut ws.f);

    let mut iterations = 0;
    let mut err = f64::INFINITY;
    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        ws.r_prev.copy_from_slice(reaction);
        ws.f_prev.copy_from_slice(&ws.f);

        let ratio = adaptive_predictor(problem, &mut ws, &mut rho, params);
        projected_step(problem, &ws.r_prev, rho, &ws.f_bar, reaction);
        modified_velocity(problem, reaction, &mut ws.f);
        grow_step(&mut rho, ratio, params.tau);

        err = compute_error(problem, reaction, velocity);
        if params.verbose > 1 {
            log::debug!(
                "EG iteration {}: error = {:e}, rho = {:e}",
                iterations,
                err,
                rho
            );
        }
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }
    report("EG", params, iterations, err)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ExtraGradientSolver;

impl Solver<FrictionContactProblem> for ExtraGradientSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dExtraGradient
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
        Ok(extra_gradient(
            problem,
            reaction,
            velocity,
            &ProjectionParams::from(options),
        ))
    }
}
