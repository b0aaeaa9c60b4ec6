use nalgebra::{DMatrix, Dyn, SymmetricEigen};
use ndarray::ArrayView2;
use num_complex::Complex64;

use crate::constants::{EIGEN_MAX_ITERATIONS, SINGULARITY_TOLERANCE};
use crate::error::{RadarError, Result};

/// Spatial covariance `x xᴴ / N` of an `(antenna, sample)` slice.
pub fn cov_matrix(x: ArrayView2<'_, Complex64>) -> Result<DMatrix<Complex64>> {
    let (antennas, samples) = x.dim();
    if samples == 0 {
        return Err(RadarError::shape(
            "covariance",
            "at least 1 sample per antenna",
            format!("{antennas} x 0"),
        ));
    }
    let scale = 1.0 / samples as f64;
    Ok(DMatrix::from_fn(antennas, antennas, |i, j| {
        x.row(i)
            .iter()
            .zip(x.row(j).iter())
            .map(|(a, b)| a * b.conj())
            .sum::<Complex64>()
            * scale
    }))
}

/// `0.5 * (R + J conj(R) J)` with `J` the exchange matrix.
pub fn forward_backward_avg(r: &DMatrix<Complex64>) -> Result<DMatrix<Complex64>> {
    let n = r.nrows();
    if r.ncols() != n {
        return Err(RadarError::shape(
            "forward-backward averaging",
            "square matrix",
            format!("{} x {}", r.nrows(), r.ncols()),
        ));
    }
    Ok(DMatrix::from_fn(n, n, |i, j| {
        (r[(i, j)] + r[(n - 1 - i, n - 1 - j)].conj()) * 0.5
    }))
}

/// Eigendecomposition of a Hermitian matrix.
pub(crate) fn hermitian_eigen(r: DMatrix<Complex64>) -> Result<SymmetricEigen<Complex64, Dyn>> {
    SymmetricEigen::try_new(r, f64::EPSILON, EIGEN_MAX_ITERATIONS).ok_or_else(|| {
        RadarError::Numerical(format!(
            "eigendecomposition did not converge in {EIGEN_MAX_ITERATIONS} iterations"
        ))
    })
}

/// Fails unless the Hermitian matrix is positive with a usable condition.
pub(crate) fn ensure_invertible(r: &DMatrix<Complex64>) -> Result<()> {
    let eigen = hermitian_eigen(r.clone())?;
    let (min, max) = eigen
        .eigenvalues
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !(max > 0.0) || min / max < SINGULARITY_TOLERANCE {
        return Err(RadarError::Numerical(format!(
            "singular covariance matrix (eigenvalues {min:.3e} .. {max:.3e})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;

    fn sample_input() -> Array2<Complex64> {
        Array2::from_shape_fn((4, 10), |(a, k)| {
            Complex64::new((a * 3 + k) as f64 * 0.37 - 1.0, ((a + 2 * k) as f64).sin())
        })
    }

    fn assert_matrix_eq(a: &DMatrix<Complex64>, b: &DMatrix<Complex64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_abs_diff_eq!(x.re, y.re, epsilon = 1e-12);
            assert_abs_diff_eq!(x.im, y.im, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_covariance_is_hermitian() {
        let r = cov_matrix(sample_input().view()).unwrap();
        assert_eq!(r.shape(), (4, 4));
        assert_matrix_eq(&r, &r.adjoint());
        for i in 0..4 {
            assert!(r[(i, i)].re >= 0.0);
        }
    }

    #[test]
    fn test_covariance_needs_samples() {
        let empty = Array2::<Complex64>::zeros((4, 0));
        assert!(matches!(
            cov_matrix(empty.view()),
            Err(RadarError::Shape { .. })
        ));
    }

    #[test]
    fn test_forward_backward_is_idempotent() {
        let r = cov_matrix(sample_input().view()).unwrap();
        let once = forward_backward_avg(&r).unwrap();
        let twice = forward_backward_avg(&once).unwrap();
        assert_matrix_eq(&once, &twice);
        assert_matrix_eq(&once, &once.adjoint());
    }

    #[test]
    fn test_forward_backward_rejects_non_square() {
        let r = DMatrix::<Complex64>::zeros(2, 3);
        assert!(forward_backward_avg(&r).is_err());
    }

    #[test]
    fn test_singular_covariance_detected() {
        assert!(matches!(
            ensure_invertible(&DMatrix::zeros(3, 3)),
            Err(RadarError::Numerical(_))
        ));
        // Rank one
        let x = Array2::from_elem((3, 5), Complex64::new(1.0, 1.0));
        let r = cov_matrix(x.view()).unwrap();
        assert!(ensure_invertible(&r).is_err());

        assert!(ensure_invertible(&DMatrix::identity(3, 3)).is_ok());
    }
}
