//! Problem descriptors.
//!
//! Problems are assembled by the caller and never modified by a solve.

use crate::{Error, Family};

/// Common interface of every problem family handled by the driver.
pub trait Problem: Sync {
    fn family(&self) -> Family;

    /// Number of unknowns in each of the reaction and velocity vectors.
    fn size(&self) -> usize;

    /// Writes the zero reaction candidate into the given buffers and reports whether it
    /// already solves the problem.
    ///
    /// The buffers are left untouched when the candidate is infeasible.
    fn trivial_solution(&self, reaction: &mut [f64], velocity: &mut [f64]) -> bool;
}

fn check_square(m: &na::DMatrix<f64>, n: usize) -> Result<(), Error> {
    if m.nrows() != m.ncols() {
        return Err(Error::InvalidProblem {
            reason: format!("matrix is {}x{}, expected square", m.nrows(), m.ncols()),
        });
    }
    if m.nrows() != n {
        return Err(Error::SizeMismatch {
            what: "matrix size",
            expected: n,
            actual: m.nrows(),
        });
    }
    Ok(())
}

/// A frictional contact problem.
///
/// Find reactions `r` and velocities `u = M r + q` such that each contact's reaction lies
/// in its Coulomb cone, the modified velocity `u + μ‖u_T‖ e_N` lies in the dual cone and
/// the two are orthogonal. Each contact block stores the normal component first followed by
/// the tangential components.
#[derive(Clone, Debug, PartialEq)]
pub struct FrictionContactProblem {
    dimension: usize,
    number_of_contacts: usize,
    m: na::DMatrix<f64>,
    q: Vec<f64>,
    mu: Vec<f64>,
}

impl FrictionContactProblem {
    pub fn new(
        dimension: usize,
        m: na::DMatrix<f64>,
        q: Vec<f64>,
        mu: Vec<f64>,
    ) -> Result<Self, Error> {
        if dimension != 2 && dimension != 3 {
            return Err(Error::InvalidProblem {
                reason: format!("contact dimension must be 2 or 3, got {}", dimension),
            });
        }
        if q.len() % dimension != 0 {
            return Err(Error::InvalidProblem {
                reason: format!(
                    "vector length {} is not a multiple of the dimension {}",
                    q.len(),
                    dimension
                ),
            });
        }
        check_square(&m, q.len())?;
        let number_of_contacts = q.len() / dimension;
        if mu.len() != number_of_contacts {
            return Err(Error::SizeMismatch {
                what: "friction coefficients",
                expected: number_of_contacts,
                actual: mu.len(),
            });
        }
        if let Some(bad) = mu.iter().find(|&&mu| !(mu >= 0.0)) {
            return Err(Error::InvalidProblem {
                reason: format!("friction coefficient {} is not non-negative", bad),
            });
        }

        Ok(FrictionContactProblem {
            dimension,
            number_of_contacts,
            m,
            q,
            mu,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn number_of_contacts(&self) -> usize {
        self.number_of_contacts
    }

    pub fn m(&self) -> &na::DMatrix<f64> {
        &self.m
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    /// Computes the velocity `u = M r + q`.
    pub fn velocity(&self, reaction: &[f64], velocity: &mut [f64]) {
        velocity.copy_from_slice(&self.q);
        crate::linalg::gemv(1.0, &self.m, reaction, 1.0, velocity);
    }
}

impl Problem for FrictionContactProblem {
    fn family(&self) -> Family {
        if self.dimension == 2 {
            Family::FrictionContact2D
        } else {
            Family::FrictionContact3D
        }
    }

    fn size(&self) -> usize {
        self.q.len()
    }

    fn trivial_solution(&self, reaction: &mut [f64], velocity: &mut [f64]) -> bool {
        let open = self
            .q
            .chunks_exact(self.dimension)
            .all(|q_c| q_c[0] >= -f64::EPSILON);
        if open {
            reaction.iter_mut().for_each(|r| *r = 0.0);
            velocity.copy_from_slice(&self.q);
        }
        open
    }
}

/// A box constrained complementarity problem, also known as the dual relay problem.
///
/// Find `z` and `w` with `M z - w = q` and `-z` in the normal cone of the box `[-b, a]` at
/// `w`.
#[derive(Clone, Debug, PartialEq)]
pub struct RelayProblem {
    m: na::DMatrix<f64>,
    q: Vec<f64>,
    a: Vec<f64>,
    b: Vec<f64>,
}

impl RelayProblem {
    pub fn new(m: na::DMatrix<f64>, q: Vec<f64>, a: Vec<f64>, b: Vec<f64>) -> Result<Self, Error> {
        let n = q.len();
        check_square(&m, n)?;
        for (what, v) in [("upper bounds", &a), ("lower bounds", &b)] {
            if v.len() != n {
                return Err(Error::SizeMismatch {
                    what,
                    expected: n,
                    actual: v.len(),
                });
            }
        }
        if let Some(i) = (0..n).find(|&i| !(-b[i] <= a[i])) {
            return Err(Error::InvalidProblem {
                reason: format!("empty box at index {}: [{}, {}]", i, -b[i], a[i]),
            });
        }
        Ok(RelayProblem { m, q, a, b })
    }

    pub fn m(&self) -> &na::DMatrix<f64> {
        &self.m
    }

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    /// Upper bounds of the box.
    pub fn a(&self) -> &[f64] {
        &self.a
    }

    /// Negated lower bounds of the box.
    pub fn b(&self) -> &[f64] {
        &self.b
    }
}

impl Problem for RelayProblem {
    fn family(&self) -> Family {
        Family::Relay
    }

    fn size(&self) -> usize {
        self.q.len()
    }

    fn trivial_solution(&self, reaction: &mut [f64], velocity: &mut [f64]) -> bool {
        let eps = f64::EPSILON;
        let inside = utils::zip!(self.q.iter(), self.a.iter(), self.b.iter())
            .all(|(&q, &a, &b)| -q >= -b - eps && -q <= a + eps);
        if inside {
            reaction.iter_mut().for_each(|z| *z = 0.0);
            velocity
                .iter_mut()
                .zip(self.q.iter())
                .for_each(|(w, &q)| *w = -q);
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friction_problem_shape() {
        let m = na::DMatrix::identity(6, 6);
        let q = vec![0.0; 6];
        assert!(FrictionContactProblem::new(3, m.clone(), q.clone(), vec![0.1, 0.2]).is_ok());
        assert!(matches!(
            FrictionContactProblem::new(3, m.clone(), q.clone(), vec![0.1]),
            Err(Error::SizeMismatch { .. })
        ));
        assert!(matches!(
            FrictionContactProblem::new(4, m.clone(), q.clone(), vec![0.1]),
            Err(Error::InvalidProblem { .. })
        ));
        assert!(matches!(
            FrictionContactProblem::new(2, na::DMatrix::identity(4, 4), q, vec![0.1; 3]),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn friction_trivial_case() -> Result<(), Error> {
        let problem = FrictionContactProblem::new(
            3,
            na::DMatrix::identity(6, 6),
            vec![0.0, -1.0, 2.0, 0.5, 0.3, -0.1],
            vec![0.5, 0.5],
        )?;
        let mut r = vec![1.0; 6];
        let mut u = vec![0.0; 6];
        assert!(problem.trivial_solution(&mut r, &mut u));
        assert_eq!(r, vec![0.0; 6]);
        assert_eq!(u, problem.q());

        let problem = FrictionContactProblem::new(
            3,
            na::DMatrix::identity(6, 6),
            vec![0.0, 0.0, 0.0, -0.5, 0.0, 0.0],
            vec![0.5, 0.5],
        )?;
        assert!(!problem.trivial_solution(&mut r, &mut u));
        Ok(())
    }

    #[test]
    fn relay_problem_shape() {
        let m = na::DMatrix::identity(2, 2);
        assert!(matches!(
            RelayProblem::new(m.clone(), vec![0.0; 2], vec![1.0], vec![1.0; 2]),
            Err(Error::SizeMismatch { .. })
        ));
        assert!(matches!(
            RelayProblem::new(m.clone(), vec![0.0; 2], vec![-2.0, 1.0], vec![1.0; 2]),
            Err(Error::InvalidProblem { .. })
        ));
        assert!(matches!(
            RelayProblem::new(na::DMatrix::identity(2, 3), vec![0.0; 2], vec![1.0; 2], vec![1.0; 2]),
            Err(Error::InvalidProblem { .. })
        ));
    }

    #[test]
    fn relay_trivial_case() -> Result<(), Error> {
        let problem = RelayProblem::new(
            na::DMatrix::identity(2, 2) * 2.0,
            vec![-1.0, -1.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )?;
        let mut z = vec![0.0; 2];
        let mut w = vec![0.0; 2];
        assert!(problem.trivial_solution(&mut z, &mut w));
        assert_eq!(w, vec![1.0, 1.0]);

        let problem = RelayProblem::new(
            na::DMatrix::identity(2, 2) * 2.0,
            vec![3.0, -3.0],
            vec![1.0, 1.0],
            vec![1.0, 1.0],
        )?;
        assert!(!problem.trivial_solution(&mut z, &mut w));
        Ok(())
    }
}
