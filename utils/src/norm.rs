//! Norms and distances over plain slices.
//!
//! These are used by solvers that keep their iterates in flat `Vec`s and only need a scalar
//! measure of progress.

use num_traits::Float;

/// Squared Euclidean norm of a slice.
pub fn norm_squared<T: Float>(v: &[T]) -> T {
    v.iter().fold(T::zero(), |acc, &x| acc + x * x)
}

/// Squared Euclidean distance between two slices of equal length.
pub fn distance_squared<T: Float>(a: &[T], b: &[T]) -> T {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(T::zero(), |acc, (&x, &y)| acc + (x - y) * (x - y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn squared_norms() {
        assert_relative_eq!(norm_squared(&[3.0, 4.0]), 25.0);
        assert_relative_eq!(distance_squared(&[1.0, 1.0], &[0.0, 2.0]), 2.0);
    }
}
