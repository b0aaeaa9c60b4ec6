use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use super::covariance::{cov_matrix, ensure_invertible, forward_backward_avg};
use super::steering::SteeringVectorSet;
use crate::error::{RadarError, Result};

/// Capon (MVDR) output for one `(antenna, snapshot)` slice.
#[derive(Debug, Clone, PartialEq)]
pub struct CaponSpectrum {
    /// `1 / (aᴴ R⁻¹ a)` per candidate angle
    pub power: Vec<Complex64>,
    /// `(angle, antenna)` weights `R⁻¹ a / (aᴴ R⁻¹ a)`
    pub weights: Array2<Complex64>,
}

impl CaponSpectrum {
    pub fn magnitude(&self) -> Vec<f64> {
        self.power.iter().map(|p| p.norm()).collect()
    }
}

/// Capon beamforming over every angle of `steering`.
///
/// The covariance is forward-backward averaged before inversion. A
/// covariance too close to singular is reported, not regularized.
pub fn aoa_capon(
    x: ArrayView2<'_, Complex64>,
    steering: &SteeringVectorSet,
) -> Result<CaponSpectrum> {
    let antennas = x.nrows();
    if steering.num_antennas() != antennas {
        return Err(RadarError::shape(
            "Capon steering vectors",
            format!("({}, {antennas})", steering.num_angles()),
            format!("({}, {})", steering.num_angles(), steering.num_antennas()),
        ));
    }

    let r = forward_backward_avg(&cov_matrix(x)?)?;
    ensure_invertible(&r)?;
    let r_inv = r
        .try_inverse()
        .ok_or_else(|| RadarError::Numerical("covariance matrix is not invertible".into()))?;

    let mut power = Vec::with_capacity(steering.num_angles());
    let mut weights = Array2::zeros((steering.num_angles(), antennas));
    for (angle, mut weight_row) in weights.rows_mut().into_iter().enumerate() {
        let a = steering.column(angle);
        let r_inv_a = &r_inv * &a;
        let denominator = a.dotc(&r_inv_a);
        if denominator.norm() == 0.0 || !denominator.is_finite() {
            return Err(RadarError::Numerical(format!(
                "Capon quadratic form vanished at angle {angle}"
            )));
        }
        power.push(denominator.inv());
        for (w, v) in weight_row.iter_mut().zip(r_inv_a.iter()) {
            *w = v / denominator;
        }
    }

    Ok(CaponSpectrum { power, weights })
}
