//! Nonsmooth Newton method on the Alart-Curnier formulation of a single contact.
//!
//! The contact law is written as the nonsmooth equation
//!
//! ```verbatim
//! Φ(r) = r - P(r - ρ ∘ (W r + q)) = 0
//! ```
//!
//! where `P` projects the normal component onto `ℝ₊` and the tangential components onto the
//! disk of radius `μ Pₙ`. Newton steps use an element of the generalized Jacobian of `Φ` and
//! are globalized with a backtracking line search on `½‖Φ‖²`.

use super::local::{LocalProblem, LocalReport, LocalSolver};
use crate::linalg::lu_solve3;
use crate::relay::DIAGONAL_THRESHOLD;
use crate::{
    SolverId, SolverOptions, Status, DPARAM_LS_COEFF, DPARAM_LS_TAU, IPARAM_LINE_SEARCH_MAX_ITER,
};

/// Armijo backtracking on the merit function `θ = ½‖Φ‖²`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Backtracking {
    /// Sufficient decrease coefficient `c` in `θ(r + αd) ≤ (1 - 2cα) θ(r)`.
    pub armijo_coeff: f64,
    /// Factor by which `α` shrinks after each rejected trial.
    pub step_factor: f64,
    /// Number of trials. Zero always takes the full step.
    pub max_iter: u32,
}

impl Backtracking {
    /// Returns the step length `α` for a Newton direction, given the merit at the current
    /// point and a function evaluating the merit at `r + αd`.
    ///
    /// Since `∇θᵀd = -‖Φ‖²` along Newton directions, the sufficient decrease test only needs
    /// `θ(r)`. If no trial is accepted, the last shrunk step is returned.
    pub fn step_length(&self, merit: f64, mut trial_merit: impl FnMut(f64) -> f64) -> f64 {
        let mut alpha = 1.0;
        for _ in 0..self.max_iter {
            if trial_merit(alpha) <= merit * (1.0 - 2.0 * self.armijo_coeff * alpha) {
                break;
            }
            alpha *= self.step_factor;
        }
        alpha
    }
}

/// Nonsmooth Newton solver for a single contact.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AlartCurnier {
    pub max_iter: u32,
    pub tolerance: f64,
    pub line_search: Backtracking,
}

impl From<&SolverOptions> for AlartCurnier {
    fn from(options: &SolverOptions) -> Self {
        AlartCurnier {
            max_iter: options.max_iter(),
            tolerance: options.tolerance(),
            line_search: Backtracking {
                armijo_coeff: options.dparam[DPARAM_LS_COEFF],
                step_factor: options.dparam[DPARAM_LS_TAU],
                max_iter: options.iparam[IPARAM_LINE_SEARCH_MAX_ITER].max(0) as u32,
            },
        }
    }
}

/// Evaluation of `Φ` at a point along with one element of its generalized Jacobian.
struct Linearization {
    phi: na::Vector3<f64>,
    jac: na::Matrix3<f64>,
}

/// Derivative of the projection onto `ℝ₊ × disk(μ Pₙ)`, together with the projected point.
fn project_with_derivative(d: &na::Vector3<f64>, mu: f64) -> (na::Vector3<f64>, na::Matrix3<f64>) {
    let mut p = na::Vector3::zeros();
    let mut dp = na::Matrix3::zeros();

    let (pn, dpn) = if d[0] > 0.0 { (d[0], 1.0) } else { (0.0, 0.0) };
    p[0] = pn;
    dp[(0, 0)] = dpn;

    let radius = mu * pn;
    let dt = na::Vector2::new(d[1], d[2]);
    let norm_t = dt.norm();
    if norm_t <= radius {
        p[1] = d[1];
        p[2] = d[2];
        dp[(1, 1)] = 1.0;
        dp[(2, 2)] = 1.0;
    } else {
        let t = dt / norm_t;
        p[1] = radius * t[0];
        p[2] = radius * t[1];
        let tangent = (na::Matrix2::identity() - t * t.transpose()) * (radius / norm_t);
        dp.fixed_view_mut::<2, 2>(1, 1).copy_from(&tangent);
        dp.fixed_view_mut::<2, 1>(1, 0)
            .copy_from(&(t * (mu * dpn)));
    }
    (p, dp)
}

impl AlartCurnier {
    fn linearize(problem: &LocalProblem, rho: &na::Vector3<f64>, r: &na::Vector3<f64>) -> Linearization {
        let u = problem.velocity(r);
        let d = r - rho.component_mul(&u);
        let (p, dp) = project_with_derivative(&d, problem.mu);
        let dd = na::Matrix3::identity() - na::Matrix3::from_diagonal(rho) * problem.w;
        Linearization {
            phi: r - p,
            jac: na::Matrix3::identity() - dp * dd,
        }
    }

    fn merit(problem: &LocalProblem, rho: &na::Vector3<f64>, r: &na::Vector3<f64>) -> f64 {
        0.5 * Self::linearize(problem, rho, r).phi.norm_squared()
    }
}

impl LocalSolver for AlartCurnier {
    fn id(&self) -> SolverId {
        SolverId::OneContactNsnAlartCurnier
    }

    fn solve(&self, problem: &LocalProblem, r: &mut na::Vector3<f64>) -> LocalReport {
        let diag = problem.w.diagonal();
        if diag.iter().any(|&w| w <= DIAGONAL_THRESHOLD) {
            return LocalReport {
                status: Status::DegenerateInput,
                iterations: 0,
                error: 0.0,
            };
        }
        // The tangential step must be isotropic for the disk projection to encode the
        // Coulomb law.
        let rho_t = 2.0 / (diag[1] + diag[2]);
        let rho = na::Vector3::new(1.0 / diag[0], rho_t, rho_t);

        let mut lin = Self::linearize(problem, &rho, r);
        let mut error = lin.phi.norm();
        let mut iterations = 0;

        while iterations < self.max_iter && error > self.tolerance {
            iterations += 1;

            // Fall back to a fixed point step if the Jacobian element is singular.
            let step = lu_solve3(lin.jac, &-lin.phi).unwrap_or_else(|_| {
                log::trace!("Alart-Curnier: singular Jacobian, taking a fixed point step");
                -lin.phi
            });

            let alpha = self.line_search.step_length(0.5 * error * error, |alpha| {
                Self::merit(problem, &rho, &(*r + step * alpha))
            });

            *r += step * alpha;
            lin = Self::linearize(problem, &rho, r);
            error = lin.phi.norm();
            log::trace!("Alart-Curnier iteration {}: |Φ| = {:e}", iterations, error);
        }

        LocalReport {
            status: Status::from_error(error, self.tolerance),
            iterations,
            error,
        }
    }
}
