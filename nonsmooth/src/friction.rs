//! Solvers for frictional contact problems.
//!
//! Reactions and velocities are stacked per contact, normal component first. Global methods
//! work with the De Saxcé modified velocity `F(r) = u + μ‖u_T‖ e_N` where `u = M r + q`, whose
//! fixed points `r = Π_K(r - ρ F(r))` are exactly the solutions of the Coulomb problem.

pub mod alart_curnier;
mod error;
mod extra_gradient;
mod fc2d;
mod fixed_point;
mod hyperplane;
pub mod local;
mod nsgs;
pub mod projection;
mod tresca;

pub use error::*;
pub use extra_gradient::*;
pub use fc2d::*;
pub use fixed_point::*;
pub use hyperplane::*;
pub use nsgs::*;
pub use tresca::*;

use projection::{project_on_cone, tangent_norm};

use crate::{Error, FrictionContactProblem, Solver, SolverId};

/// All solvers for frictional contact problems.
pub fn solvers() -> Vec<Box<dyn Solver<FrictionContactProblem>>> {
    vec![
        Box::new(Fc2dNsgsSolver),
        Box::new(NsgsSolver),
        Box::new(TrescaFixedPointSolver),
        Box::new(DeSaxceFixedPointSolver),
        Box::new(FixedPointProjectionSolver),
        Box::new(ExtraGradientSolver),
        Box::new(HyperplaneProjectionSolver),
    ]
}

/// Rejects problems whose contact dimension differs from `dimension`.
pub(crate) fn check_dimension(
    id: SolverId,
    problem: &FrictionContactProblem,
    dimension: usize,
) -> Result<(), Error> {
    if problem.dimension() != dimension {
        return Err(Error::UnsupportedDimension {
            id,
            dimension: problem.dimension(),
        });
    }
    Ok(())
}

/// Computes the De Saxcé modified velocity `F(r)` into `f`.
pub(crate) fn modified_velocity(problem: &FrictionContactProblem, reaction: &[f64], f: &mut [f64]) {
    problem.velocity(reaction, f);
    let dim = problem.dimension();
    for (f, &mu) in f.chunks_exact_mut(dim).zip(problem.mu().iter()) {
        f[0] += mu * tangent_norm(f);
    }
}

/// Projects every contact block of `reaction` onto its friction cone.
pub(crate) fn project_reactions(problem: &FrictionContactProblem, reaction: &mut [f64]) {
    let dim = problem.dimension();
    for (r, &mu) in reaction.chunks_exact_mut(dim).zip(problem.mu().iter()) {
        project_on_cone(r, mu);
    }
}

/// Computes `out = Π_K(r - rho * f)`.
pub(crate) fn projected_step(
    problem: &FrictionContactProblem,
    r: &[f64],
    rho: f64,
    f: &[f64],
    out: &mut [f64],
) {
    out.copy_from_slice(r);
    crate::linalg::axpy(-rho, f, out);
    project_reactions(problem, out);
}
