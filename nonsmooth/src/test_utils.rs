//! Problem fixtures shared by unit tests, integration tests and benchmarks.

use rand::distributions::Uniform;
use rand::prelude::*;

use crate::{Error, FrictionContactProblem, RelayProblem};

/*
 * Small hand made problems with known solutions.
 */

/// One contact with an identity Delassus operator, pushed into the obstacle and sliding.
///
/// The solution is `r = (1, -0.3, 0)` with `u = (0, 0.2, 0)`.
pub fn single_contact_problem() -> Result<FrictionContactProblem, Error> {
    FrictionContactProblem::new(
        3,
        na::DMatrix::identity(3, 3),
        vec![-1.0, 0.5, 0.0],
        vec![0.3],
    )
}

/// Two coupled contacts, both closed and sliding.
pub fn two_contact_problem() -> Result<FrictionContactProblem, Error> {
    #[rustfmt::skip]
    let m = na::DMatrix::from_row_slice(6, 6, &[
        1.5,  0.2, 0.1,  0.3, 0.05, 0.0,
        0.2,  1.2, 0.0,  0.0, 0.1,  0.05,
        0.1,  0.0, 1.1,  0.05, 0.0, 0.1,
        0.3,  0.0, 0.05, 1.3, -0.1, 0.0,
        0.05, 0.1, 0.0, -0.1,  1.0, 0.1,
        0.0,  0.05, 0.1, 0.0,  0.1, 1.4,
    ]);
    FrictionContactProblem::new(
        3,
        m,
        vec![-1.0, 0.4, -0.2, -0.5, -0.6, 0.3],
        vec![0.3, 0.5],
    )
}

/// Two coupled two dimensional contacts, both sliding.
pub fn two_dimensional_problem() -> Result<FrictionContactProblem, Error> {
    #[rustfmt::skip]
    let m = na::DMatrix::from_row_slice(4, 4, &[
        1.5, 0.2, 0.3,  0.0,
        0.2, 1.2, 0.0,  0.1,
        0.3, 0.0, 1.3, -0.1,
        0.0, 0.1, -0.1, 1.0,
    ]);
    FrictionContactProblem::new(2, m, vec![-1.0, 0.4, -0.5, -0.6], vec![0.3, 0.5])
}

/// A coupled relay problem with two active bounds.
///
/// The solution is `z = (8/9, -37/18, 7/9)` with `w = (-0.5, 0.5, -1)`.
pub fn box_relay_problem() -> Result<RelayProblem, Error> {
    #[rustfmt::skip]
    let m = na::DMatrix::from_row_slice(3, 3, &[
        4.0, 1.0, 0.0,
        1.0, 3.0, 1.0,
        0.0, 1.0, 2.0,
    ]);
    RelayProblem::new(
        m,
        vec![2.0, -5.0, 0.5],
        vec![1.0, 0.5, 2.0],
        vec![0.5, 1.0, 1.0],
    )
}

/*
 * Random problems
 */

/// Builds a symmetric positive definite matrix `G Gᵀ / n + I`.
fn random_spd_matrix(n: usize, rng: &mut StdRng) -> na::DMatrix<f64> {
    let dist = Uniform::new_inclusive(-1.0, 1.0);
    let g = na::DMatrix::from_fn(n, n, |_, _| rng.sample(dist));
    let mut m = &g * g.transpose() / n as f64;
    for i in 0..n {
        m[(i, i)] += 1.0;
    }
    m
}

/// A random three dimensional frictional contact problem with a positive definite Delassus
/// operator and every contact pushed into its obstacle.
pub fn random_friction_problem(
    number_of_contacts: usize,
    mu: f64,
    seed: u64,
) -> Result<FrictionContactProblem, Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let n = 3 * number_of_contacts;
    let m = random_spd_matrix(n, &mut rng);
    let normal = Uniform::new_inclusive(-1.0, -0.1);
    let tangent = Uniform::new_inclusive(-1.0, 1.0);
    let q = (0..n)
        .map(|i| {
            if i % 3 == 0 {
                rng.sample(normal)
            } else {
                rng.sample(tangent)
            }
        })
        .collect();
    FrictionContactProblem::new(3, m, q, vec![mu; number_of_contacts])
}

/// A random relay problem with a positive definite matrix.
pub fn random_relay_problem(n: usize, seed: u64) -> Result<RelayProblem, Error> {
    let mut rng = StdRng::seed_from_u64(seed);
    let m = random_spd_matrix(n, &mut rng);
    let rhs = Uniform::new_inclusive(-2.0, 2.0);
    let bound = Uniform::new_inclusive(0.5, 1.5);
    let q = (0..n).map(|_| rng.sample(rhs)).collect();
    let a = (0..n).map(|_| rng.sample(bound)).collect();
    let b = (0..n).map(|_| rng.sample(bound)).collect();
    RelayProblem::new(m, q, a, b)
}
