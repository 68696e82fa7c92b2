#![allow(dead_code)]

pub use nonsmooth::test_utils::*;

use approx::assert_relative_eq;

pub fn init_logger() {
    let _ = env_logger::Builder::from_env("NONSMOOTH_LOG")
        .is_test(true)
        .try_init();
}

/// Utility function to compare two solution vectors entry by entry.
pub fn compare_vectors(solution: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(solution.len(), expected.len());
    for (&x, &y) in solution.iter().zip(expected.iter()) {
        assert_relative_eq!(x, y, epsilon = tol);
    }
}

/// Checks that `velocity = M reaction + q`.
pub fn check_friction_velocity(
    problem: &nonsmooth::FrictionContactProblem,
    reaction: &[f64],
    velocity: &[f64],
) {
    let mut expected = vec![0.0; velocity.len()];
    problem.velocity(reaction, &mut expected);
    compare_vectors(velocity, &expected, 1e-12);
}
