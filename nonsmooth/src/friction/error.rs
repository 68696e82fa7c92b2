use super::projection::{project_on_cone, project_on_cylinder, tangent_norm};
use crate::FrictionContactProblem;

/// Natural map residual of a single contact: `‖r - Π_K(r - û)‖²` where
/// `û = u + μ‖u_T‖ e_N` is the modified velocity.
pub fn contact_error_squared(r: &[f64], u: &[f64], mu: f64) -> f64 {
    let mut buf = [0.0; 3];
    let w = &mut buf[..r.len()];
    w.copy_from_slice(r);
    w[0] -= u[0] + mu * tangent_norm(u);
    for (w, &u) in w[1..].iter_mut().zip(u[1..].iter()) {
        *w -= u;
    }
    project_on_cone(w, mu);
    r.iter().zip(w.iter()).map(|(&r, &w)| (r - w) * (r - w)).sum()
}

/// Computes the velocity `u = M r + q` and returns the friction error of `(r, u)`.
///
/// The error is the Euclidean norm of the stacked per contact natural map residuals, divided
/// by `‖q‖` unless `q` vanishes. It is zero exactly at a solution.
pub fn compute_error(problem: &FrictionContactProblem, reaction: &[f64], velocity: &mut [f64]) -> f64 {
    problem.velocity(reaction, velocity);
    let dim = problem.dimension();
    let error = utils::zip!(
        reaction.chunks_exact(dim),
        velocity.chunks_exact(dim),
        problem.mu().iter()
    )
    .map(|(r, u, &mu)| contact_error_squared(r, u, mu))
    .sum::<f64>()
    .sqrt();

    let q_norm = crate::linalg::nrm2(problem.q());
    if q_norm > f64::EPSILON {
        error / q_norm
    } else {
        error
    }
}

/// Computes the velocity `u = M r + q` and returns the error of `(r, u)` with respect to the
/// Tresca problem with the given per contact thresholds.
///
/// Normalized like [`compute_error`].
pub fn compute_tresca_error(
    problem: &FrictionContactProblem,
    reaction: &[f64],
    velocity: &mut [f64],
    thresholds: &[f64],
) -> f64 {
    problem.velocity(reaction, velocity);
    let dim = problem.dimension();
    let mut buf = [0.0; 3];
    let error = utils::zip!(
        reaction.chunks_exact(dim),
        velocity.chunks_exact(dim),
        thresholds.iter()
    )
    .map(|(r, u, &s)| {
        let w = &mut buf[..dim];
        for (w, &r, &u) in utils::zip!(w.iter_mut(), r.iter(), u.iter()) {
            *w = r - u;
        }
        project_on_cylinder(w, s);
        r.iter().zip(w.iter()).map(|(&r, &w)| (r - w) * (r - w)).sum::<f64>()
    })
    .sum::<f64>()
    .sqrt();

    let q_norm = crate::linalg::nrm2(problem.q());
    if q_norm > f64::EPSILON {
        error / q_norm
    } else {
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::single_contact_problem;
    use crate::Error;

    #[test]
    fn exact_solution_has_zero_error() -> Result<(), Error> {
        let problem = single_contact_problem()?;
        let mut u = vec![0.0; 3];
        let err = compute_error(&problem, &[1.0, -0.3, 0.0], &mut u);
        assert!(err < 1e-14);
        approx::assert_relative_eq!(u[1], 0.2, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn tresca_error_uses_thresholds() -> Result<(), Error> {
        let problem = single_contact_problem()?;
        let mut u = vec![0.0; 3];
        // Stick-free normal reaction solves the frictionless Tresca problem only.
        assert!(compute_tresca_error(&problem, &[1.0, 0.0, 0.0], &mut u, &[0.0]) < 1e-14);
        assert!(compute_tresca_error(&problem, &[1.0, 0.0, 0.0], &mut u, &[0.3]) > 0.1);
        assert!(compute_tresca_error(&problem, &[1.0, -0.3, 0.0], &mut u, &[0.3]) < 1e-14);
        Ok(())
    }

    #[test]
    fn zero_reaction_is_not_a_solution() -> Result<(), Error> {
        let problem = single_contact_problem()?;
        let mut u = vec![0.0; 3];
        let err = compute_error(&problem, &[0.0; 3], &mut u);
        assert!(err > 0.1);
        assert_eq!(u, problem.q());
        Ok(())
    }
}
