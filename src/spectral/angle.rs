//! Angle FFTs over the physical antenna grid.
//!
//! FFT bin `k` of an `n`-point spatial transform (after centring) measures
//! `sin(theta) = (k - n/2) * 2/n` for half-wavelength spacing, so the bin
//! axes are arcsine-spaced rather than linear.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use num_complex::Complex64;
use rustfft::FftPlanner;

use super::range::RadarCube;
use super::{fft_along, fft2, fftshift};
use crate::config::ProcessingConfig;
use crate::error::{RadarError, Result};

/// Angle profiles of a radar cube.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSpectrum {
    /// `(azimuth bin, range bin)` magnitudes averaged over the elevation axis
    pub azimuth: Array2<f64>,
    /// `(elevation bin, range bin)` magnitudes averaged over the azimuth axis
    pub elevation: Array2<f64>,
    /// Azimuth bin centres in degrees
    pub azimuth_bins: Vec<f64>,
    /// Elevation bin centres in degrees
    pub elevation_bins: Vec<f64>,
}

/// Arcsine-spaced angle axis in degrees for an `n`-point centred FFT.
pub fn arcsine_bins(n: usize) -> Vec<f64> {
    let half = n as f64 / 2.0;
    (0..n)
        .map(|k| ((k as f64 - half) * 2.0 / n as f64).asin().to_degrees())
        .collect()
}

/// 2-D FFT over the `(grid row, grid column)` plane of every range bin.
///
/// The plane is zero-padded to `(elevation_bins, azimuth_bins)` and centred
/// on both axes. Fails if the grid is larger than the configured bins.
pub fn angle_fft(cube: &RadarCube, processing: &ProcessingConfig) -> Result<AngleSpectrum> {
    let (grid_rows, grid_cols, range_bins) = cube.shape();
    let (el_bins, az_bins) = (processing.elevation_bins, processing.azimuth_bins);
    if grid_rows > el_bins || grid_cols > az_bins {
        return Err(RadarError::shape(
            "angle FFT",
            format!("grid within {el_bins} x {az_bins} angle bins"),
            format!("{grid_rows} x {grid_cols} grid"),
        ));
    }

    let mut planner = FftPlanner::new();
    let mut azimuth = Array2::<f64>::zeros((az_bins, range_bins));
    let mut elevation = Array2::<f64>::zeros((el_bins, range_bins));

    for bin in 0..range_bins {
        let spectrum = fft2(cube.range_slice(bin), el_bins, az_bins, &mut planner);
        let mut magnitude = spectrum.mapv(|z| z.norm());
        fftshift(&mut magnitude, Axis(0));
        fftshift(&mut magnitude, Axis(1));

        azimuth
            .column_mut(bin)
            .assign(&mean_or_zeros(&magnitude, Axis(0), az_bins));
        elevation
            .column_mut(bin)
            .assign(&mean_or_zeros(&magnitude, Axis(1), el_bins));
    }

    Ok(AngleSpectrum {
        azimuth,
        elevation,
        azimuth_bins: arcsine_bins(az_bins),
        elevation_bins: arcsine_bins(el_bins),
    })
}

fn mean_or_zeros(data: &Array2<f64>, axis: Axis, len: usize) -> Array1<f64> {
    data.mean_axis(axis).unwrap_or_else(|| Array1::zeros(len))
}

/// Centred magnitude spectrum of one antenna line, zero-padded to `bins`.
pub fn line_angle_fft(line: ArrayView1<'_, Complex64>, bins: usize) -> Result<Vec<f64>> {
    if line.len() > bins {
        return Err(RadarError::shape(
            "line angle FFT",
            format!("at most {bins} antennas"),
            line.len(),
        ));
    }
    let column = line.insert_axis(Axis(1));
    let mut planner = FftPlanner::new();
    let mut magnitude = fft_along(column, Axis(0), bins, &mut planner).mapv(|z| z.norm());
    fftshift(&mut magnitude, Axis(0));
    Ok(magnitude.column(0).to_vec())
}
