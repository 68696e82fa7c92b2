use super::error::compute_error;
use super::local::STEP_GROWTH_RATIO;
use super::{check_dimension, modified_velocity, projected_step};
use crate::{
    Error, FrictionContactProblem, Outcome, Solver, SolverId, SolverOptions, Status,
    DPARAM_LS_COEFF, DPARAM_LS_TAU, DPARAM_RHO, IPARAM_LINE_SEARCH_MAX_ITER,
};

/// Parameters shared by the projection based global methods.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionParams {
    pub max_iter: u32,
    pub tolerance: f64,
    /// Initial step size `ρ`.
    pub rho: f64,
    /// Step size reduction factor `τ`.
    pub tau: f64,
    /// Step control coefficient. Its meaning depends on the method.
    pub coeff: f64,
    pub max_line_search: u32,
    pub verbose: u8,
}

impl From<&SolverOptions> for ProjectionParams {
    fn from(options: &SolverOptions) -> Self {
        ProjectionParams {
            max_iter: options.max_iter(),
            tolerance: options.tolerance(),
            rho: options.dparam[DPARAM_RHO],
            tau: options.dparam[DPARAM_LS_TAU],
            coeff: options.dparam[DPARAM_LS_COEFF],
            max_line_search: options.iparam[IPARAM_LINE_SEARCH_MAX_ITER].max(0) as u32,
            verbose: options.verbose,
        }
    }
}

/// Buffers shared by the projection based global methods.
pub(crate) struct ProjectionWorkspace {
    /// Previous iterate.
    pub r_prev: Vec<f64>,
    /// `F` at the previous iterate.
    pub f_prev: Vec<f64>,
    /// `F` at the current iterate.
    pub f: Vec<f64>,
    /// Predictor iterate and `F` evaluated there.
    pub r_bar: Vec<f64>,
    pub f_bar: Vec<f64>,
}

impl ProjectionWorkspace {
    pub fn new(n: usize) -> Self {
        ProjectionWorkspace {
            r_prev: vec![0.0; n],
            f_prev: vec![0.0; n],
            f: vec![0.0; n],
            r_bar: vec![0.0; n],
            f_bar: vec![0.0; n],
        }
    }
}

/// Computes the predictor `r̄ = Π_K(r - ρ F(r))` and `F(r̄)`, shrinking `ρ` until
/// `ρ ‖F(r) - F(r̄)‖ ≤ L ‖r - r̄‖`.
///
/// Expects `ws.r_prev` and `ws.f_prev` to hold `r` and `F(r)`. Returns the final ratio
/// `ρ ‖F(r) - F(r̄)‖ / ‖r - r̄‖`, which is zero when the predictor did not move.
pub(crate) fn adaptive_predictor(
    problem: &FrictionContactProblem,
    ws: &mut ProjectionWorkspace,
    rho: &mut f64,
    params: &ProjectionParams,
) -> f64 {
    let mut ratio = 0.0;
    for _ in 0..=params.max_line_search {
        projected_step(problem, &ws.r_prev, *rho, &ws.f_prev, &mut ws.r_bar);
        modified_velocity(problem, &ws.r_bar, &mut ws.f_bar);

        let dr = utils::distance_squared(&ws.r_prev, &ws.r_bar).sqrt();
        ratio = if dr > 0.0 {
            *rho * utils::distance_squared(&ws.f_prev, &ws.f_bar).sqrt() / dr
        } else {
            0.0
        };
        if ratio <= params.coeff {
            break;
        }
        *rho *= params.tau;
    }
    ratio
}

/// Increases `ρ` again when the last accepted step was far from the stability limit.
#[inline]
pub(crate) fn grow_step(rho: &mut f64, ratio: f64, tau: f64) {
    if ratio < STEP_GROWTH_RATIO {
        *rho /= tau;
    }
}

pub(crate) fn report(name: &str, params: &ProjectionParams, iterations: u32, err: f64) -> Outcome {
    let status = Status::from_error(err, params.tolerance);
    if params.verbose > 0 {
        log::info!(
            "{}: {:?} after {} iterations, error = {:e}",
            name,
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

/// De Saxcé fixed point iteration `r ← Π_K(r - ρ F(r))` with a constant step.
pub fn desaxce_fixed_point(
    problem: &FrictionContactProblem,
    reaction: &mut [f64],
    velocity: &mut [f64],
    params: &ProjectionParams,
) -> Outcome {
    let mut f = vec![0.0; reaction.len()];
    let mut next = vec![0.0; reaction.len()];

    let mut iterations = 0;
    let mut err = f64::INFINITY;
    while iterations < params.max_iter && err > params.tolerance {
        iterations += 1;
        modified_velocity(problem, reaction, &mut f);
        projected_step(problem, reaction, params.rho, &f, &mut next);
        reaction.copy_from_slice(&next);
        err = compute_error(problem, reaction, velocity);

        if params.verbose > 1 {
            log::debug!("DSFP iteration {}: error = {:e}", iterations, err);
        }
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }
    report("DSFP", params, iterations, err)
}

/// Fixed point projection with a self adapting step size.
pub fn fixed_point_projection(
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
        reaction.copy_from_slice(&ws.r_bar);
        ws.f.copy_from_slice(&ws.f_bar);
        grow_step(&mut rho, ratio, params.tau);

        err = compute_error(problem, reaction, velocity);
        if params.verbose > 1 {
            log::debug!(
                "FPP iteration {}: error = {:e}, rho = {:e}",
                iterations,
                err,
                rho
            );
        }
    }
    if iterations == 0 {
        problem.velocity(reaction, velocity);
    }
    report("FPP", params, iterations, err)
}

#[derive(Copy, Clone, Debug, Default)]
pub struct DeSaxceFixedPointSolver;

impl Solver<FrictionContactProblem> for DeSaxceFixedPointSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dDeSaxceFixedPoint
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
        Ok(desaxce_fixed_point(
            problem,
            reaction,
            velocity,
            &ProjectionParams::from(options),
        ))
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FixedPointProjectionSolver;

impl Solver<FrictionContactProblem> for FixedPointProjectionSolver {
    fn id(&self) -> SolverId {
        SolverId::Fc3dFixedPointProjection
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
        Ok(fixed_point_projection(
            problem,
            reaction,
            velocity,
            &ProjectionParams::from(options),
        ))
    }
}
