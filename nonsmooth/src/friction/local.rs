//! Solvers for the single contact sub-problems of Gauss-Seidel methods.

use super::alart_curnier::AlartCurnier;
use super::error::contact_error_squared;
use super::projection::{project_on_cone, project_on_cylinder, tangent_norm};
use crate::relay::DIAGONAL_THRESHOLD;
use crate::{
    Error, Family, SolverId, SolverOptions, Status, DPARAM_LS_COEFF, DPARAM_LS_TAU, DPARAM_RHO,
    IPARAM_LINE_SEARCH_MAX_ITER,
};

/// Ratio below which adaptive step sizes are increased again.
pub(crate) const STEP_GROWTH_RATIO: f64 = 0.3;

/// A three dimensional single contact problem.
///
/// Find `r` in the cone of friction coefficient `mu` (or in the Tresca cylinder of radius
/// `threshold` when given) complementary to `u = W r + q`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalProblem {
    pub w: na::Matrix3<f64>,
    pub q: na::Vector3<f64>,
    pub mu: f64,
    pub threshold: Option<f64>,
}

impl LocalProblem {
    pub fn velocity(&self, r: &na::Vector3<f64>) -> na::Vector3<f64> {
        self.w * r + self.q
    }

    /// Natural map residual of the Coulomb problem at `r`.
    pub fn error(&self, r: &na::Vector3<f64>) -> f64 {
        let u = self.velocity(r);
        contact_error_squared(r.as_slice(), u.as_slice(), self.mu).sqrt()
    }

    /// Velocity with the De Saxcé correction `u + μ‖u_T‖ e_N`.
    fn modified_velocity(&self, r: &na::Vector3<f64>) -> na::Vector3<f64> {
        let mut u = self.velocity(r);
        u[0] += self.mu * tangent_norm(u.as_slice());
        u
    }
}

/// Summary of a local solve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LocalReport {
    pub status: Status,
    pub iterations: u32,
    pub error: f64,
}

impl LocalReport {
    fn degenerate() -> Self {
        LocalReport {
            status: Status::DegenerateInput,
            iterations: 0,
            error: 0.0,
        }
    }
}

pub trait LocalSolver: Send + Sync {
    fn id(&self) -> SolverId;
    /// Improves `r` in place. `r` holds the current iterate on entry.
    fn solve(&self, problem: &LocalProblem, r: &mut na::Vector3<f64>) -> LocalReport;
}

/// Builds the one contact solver configured by `options`.
pub fn make_local_solver(options: &SolverOptions) -> Result<Box<dyn LocalSolver>, Error> {
    let tolerance = options.tolerance();
    let solver: Box<dyn LocalSolver> = match options.solver_id {
        SolverId::OneContactProjectionOnCone => Box::new(ProjectionOnCone { tolerance }),
        SolverId::OneContactProjectionOnConeWithLocalIteration => {
            Box::new(ProjectionOnConeWithLocalIteration {
                max_iter: options.max_iter(),
                tolerance,
                rho: options.dparam[DPARAM_RHO],
                tau: options.dparam[DPARAM_LS_TAU],
                lipschitz: options.dparam[DPARAM_LS_COEFF],
                max_line_search: options.iparam[IPARAM_LINE_SEARCH_MAX_ITER].max(0) as u32,
            })
        }
        SolverId::OneContactProjectionOnCylinder => Box::new(ProjectionOnCylinder { tolerance }),
        SolverId::OneContactNsnAlartCurnier => Box::new(AlartCurnier::from(options)),
        id => {
            debug_assert_ne!(id.family(), Family::OneContact);
            return Err(Error::InvalidConfiguration {
                id,
                reason: "not a one contact solver".to_string(),
            });
        }
    };
    Ok(solver)
}

/// A single projection step with `ρ = 1 / W₀₀`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionOnCone {
    pub tolerance: f64,
}

impl LocalSolver for ProjectionOnCone {
    fn id(&self) -> SolverId {
        SolverId::OneContactProjectionOnCone
    }

    fn solve(&self, problem: &LocalProblem, r: &mut na::Vector3<f64>) -> LocalReport {
        let w00 = problem.w[(0, 0)];
        if w00 <= DIAGONAL_THRESHOLD {
            return LocalReport::degenerate();
        }
        let u = problem.modified_velocity(r);
        *r -= u / w00;
        project_on_cone(r.as_mut_slice(), problem.mu);

        let error = problem.error(r);
        LocalReport {
            status: Status::from_error(error, self.tolerance),
            iterations: 1,
            error,
        }
    }
}

/// Repeated projection steps with a step size adapted to the local Lipschitz constant.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionOnConeWithLocalIteration {
    pub max_iter: u32,
    pub tolerance: f64,
    /// Initial step size relative to `1 / W₀₀`.
    pub rho: f64,
    /// Step size reduction factor.
    pub tau: f64,
    /// Steps are accepted when `ρ ‖F(r) - F(r⁺)‖ ≤ lipschitz ‖r - r⁺‖`.
    pub lipschitz: f64,
    pub max_line_search: u32,
}

impl LocalSolver for ProjectionOnConeWithLocalIteration {
    fn id(&self) -> SolverId {
        SolverId::OneContactProjectionOnConeWithLocalIteration
    }

    fn solve(&self, problem: &LocalProblem, r: &mut na::Vector3<f64>) -> LocalReport {
        let w00 = problem.w[(0, 0)];
        if w00 <= DIAGONAL_THRESHOLD {
            return LocalReport::degenerate();
        }

        let mut rho = self.rho / w00;
        let mut error = problem.error(r);
        let mut iterations = 0;
        let mut f = problem.modified_velocity(r);

        while iterations < self.max_iter && error > self.tolerance {
            iterations += 1;
            let r_prev = *r;
            let f_prev = f;

            let mut ratio = 0.0;
            for _ in 0..=self.max_line_search {
                *r = r_prev - f_prev * rho;
                project_on_cone(r.as_mut_slice(), problem.mu);
                f = problem.modified_velocity(r);

                let dr = (r_prev - *r).norm();
                ratio = if dr > 0.0 {
                    rho * (f_prev - f).norm() / dr
                } else {
                    0.0
                };
                if ratio <= self.lipschitz {
                    break;
                }
                rho *= self.tau;
            }
            if ratio < STEP_GROWTH_RATIO {
                rho /= self.tau;
            }

            error = problem.error(r);
        }

        LocalReport {
            status: Status::from_error(error, self.tolerance),
            iterations,
            error,
        }
    }
}

/// A single projection step onto the Tresca cylinder.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ProjectionOnCylinder {
    pub tolerance: f64,
}

impl LocalSolver for ProjectionOnCylinder {
    fn id(&self) -> SolverId {
        SolverId::OneContactProjectionOnCylinder
    }

    fn solve(&self, problem: &LocalProblem, r: &mut na::Vector3<f64>) -> LocalReport {
        let w00 = problem.w[(0, 0)];
        if w00 <= DIAGONAL_THRESHOLD {
            return LocalReport::degenerate();
        }
        let s = problem.threshold.unwrap_or(0.0);
        let u = problem.velocity(r);
        let r_prev = *r;
        *r -= u / w00;
        project_on_cylinder(r.as_mut_slice(), s);

        let error = (*r - r_prev).norm();
        LocalReport {
            status: Status::from_error(error, self.tolerance),
            iterations: 1,
            error,
        }
    }
}
