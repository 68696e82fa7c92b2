//! Dense linear algebra kernels over flat slices.
//!
//! Solvers keep their iterates in `Vec<f64>` buffers. These helpers wrap the buffers in
//! `nalgebra` views so the underlying BLAS-like routines can be reused without copies.

use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Matrix is not positive definite")]
    NotPositiveDefinite,
    #[error("Matrix is singular")]
    SingularMatrix,
}

/// Computes `y = alpha * A * x + beta * y`.
pub fn gemv(alpha: f64, a: &na::DMatrix<f64>, x: &[f64], beta: f64, y: &mut [f64]) {
    let x: na::DVectorView<f64> = x.into();
    let mut y: na::DVectorViewMut<f64> = y.into();
    y.gemv(alpha, a, &x, beta);
}

/// Computes `y = alpha * x + y`.
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    let x: na::DVectorView<f64> = x.into();
    let mut y: na::DVectorViewMut<f64> = y.into();
    y.axpy(alpha, &x, 1.0);
}

/// Scales `x` by `alpha` in place.
pub fn scal(alpha: f64, x: &mut [f64]) {
    let mut x: na::DVectorViewMut<f64> = x.into();
    x *= alpha;
}

pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    let x: na::DVectorView<f64> = x.into();
    let y: na::DVectorView<f64> = y.into();
    x.dot(&y)
}

/// Euclidean norm.
pub fn nrm2(x: &[f64]) -> f64 {
    let x: na::DVectorView<f64> = x.into();
    x.norm()
}

/// Cholesky factorization of a dense symmetric positive definite matrix.
///
/// Only the lower triangle of the input is read.
#[derive(Clone, Debug)]
pub struct DenseCholesky {
    factor: na::Cholesky<f64, na::Dyn>,
}

impl DenseCholesky {
    pub fn new(mtx: na::DMatrix<f64>) -> Result<Self, Error> {
        na::Cholesky::new(mtx)
            .map(|factor| DenseCholesky { factor })
            .ok_or(Error::NotPositiveDefinite)
    }

    pub fn dim(&self) -> usize {
        self.factor.l_dirty().nrows()
    }

    /// Solves `A x = rhs` by a forward and a backward triangular solve, overwriting `rhs`
    /// with the solution.
    ///
    /// # Panics
    ///
    /// This function panics if `rhs` does not match the size of the factorized matrix.
    pub fn solve_in_place<'a>(&self, rhs: &'a mut [f64]) -> &'a [f64] {
        assert_eq!(rhs.len(), self.dim());
        {
            let mut b: na::DVectorViewMut<f64> = (&mut *rhs).into();
            self.factor.solve_mut(&mut b);
        }
        &*rhs
    }
}

/// Solves a small dense system `A x = b` with partial pivoting LU.
pub fn lu_solve3(a: na::Matrix3<f64>, b: &na::Vector3<f64>) -> Result<na::Vector3<f64>, Error> {
    a.lu().solve(b).ok_or(Error::SingularMatrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn vector_kernels() {
        let a = na::DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let mut y = vec![1.0, 1.0];
        gemv(2.0, &a, &[1.0, -1.0], 3.0, &mut y);
        assert_eq!(y, vec![1.0, 1.0]);

        axpy(-1.0, &[1.0, 2.0], &mut y);
        assert_eq!(y, vec![0.0, -1.0]);
        scal(-2.0, &mut y);
        assert_eq!(y, vec![0.0, 2.0]);
        assert_eq!(dot(&[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_relative_eq!(nrm2(&[3.0, 4.0]), 5.0);
    }

    #[test]
    fn cholesky_solve() -> Result<(), Error> {
        let a = na::DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let chol = DenseCholesky::new(a)?;
        let mut rhs = vec![6.0, 5.0];
        chol.solve_in_place(&mut rhs);
        assert_relative_eq!(rhs[0], 1.0, max_relative = 1e-12);
        assert_relative_eq!(rhs[1], 1.0, max_relative = 1e-12);
        Ok(())
    }

    #[test]
    fn cholesky_rejects_indefinite() {
        let a = na::DMatrix::from_row_slice(2, 2, &[2.0, 3.0, 3.0, 2.0]);
        assert_eq!(DenseCholesky::new(a).unwrap_err(), Error::NotPositiveDefinite);
    }

    #[test]
    fn small_lu() -> Result<(), Error> {
        let a = na::Matrix3::new(2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0);
        let x = lu_solve3(a, &na::Vector3::new(2.0, 3.0, 4.0))?;
        assert_eq!(x, na::Vector3::new(1.0, 4.0, 3.0));
        assert!(lu_solve3(na::Matrix3::zeros(), &x).is_err());
        Ok(())
    }
}
