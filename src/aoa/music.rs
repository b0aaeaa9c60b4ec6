use nalgebra::DMatrix;
use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use super::covariance::hermitian_eigen;
use super::steering::SteeringVectorSet;
use crate::error::{RadarError, Result};

/// MUSIC pseudo-spectrum of an `(antenna, range bin)` range FFT.
///
/// Each range column gives a single-snapshot covariance. The eigenvector
/// of the largest eigenvalue is taken as the signal subspace and the rest
/// as noise; the result is `(range bin, angle)` holding
/// `1 / |aᴴ Qn Qnᴴ a|`.
pub fn music_spectrum(
    range_fft: ArrayView2<'_, Complex64>,
    steering: &SteeringVectorSet,
) -> Result<Array2<f64>> {
    let (antennas, bins) = range_fft.dim();
    if steering.num_antennas() != antennas {
        return Err(RadarError::shape(
            "MUSIC steering vectors",
            format!("({}, {antennas})", steering.num_angles()),
            format!("({}, {})", steering.num_angles(), steering.num_antennas()),
        ));
    }
    if antennas < 2 {
        return Err(RadarError::shape(
            "MUSIC",
            "at least 2 antennas for a noise subspace",
            antennas,
        ));
    }

    let columns: Vec<_> = (0..steering.num_angles())
        .map(|angle| steering.column(angle))
        .collect();
    let scale = 1.0 / antennas as f64;
    let mut spectrum = Array2::zeros((bins, steering.num_angles()));

    for (bin, mut out) in spectrum.rows_mut().into_iter().enumerate() {
        let x = range_fft.column(bin);
        let r = DMatrix::from_fn(antennas, antennas, |i, j| x[i] * x[j].conj() * scale);
        let eigen = hermitian_eigen(r)?;

        let dominant = eigen
            .eigenvalues
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map_or(0, |(i, _)| i);
        let noise = eigen.eigenvectors.remove_column(dominant);
        let projector = &noise * noise.adjoint();

        for (value, a) in out.iter_mut().zip(&columns) {
            let denominator = a.dotc(&(&projector * a)).norm();
            if denominator == 0.0 || !denominator.is_finite() {
                return Err(RadarError::Numerical(format!(
                    "MUSIC projection vanished at range bin {bin}"
                )));
            }
            *value = 1.0 / denominator;
        }
    }

    log::debug!(
        "MUSIC spectrum over {bins} range bins x {} angles",
        steering.num_angles()
    );
    Ok(spectrum)
}
