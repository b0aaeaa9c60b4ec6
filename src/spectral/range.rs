//! Range FFT and radar cube assembly.

use ndarray::{Array2, Array3, ArrayView2, Axis};
use num_complex::Complex64;
use rustfft::FftPlanner;

use super::{fft_along, linspace, zero_near_field};
use crate::config::{ProcessingConfig, RadarConfiguration};
use crate::device::AntennaLayout;
use crate::error::{RadarError, Result};

/// Range FFT of a `(row, sample)` signal.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeSpectrum {
    /// `(row, range bin)`; rows are whatever the input rows were (antennas or chirps)
    pub spectrum: Array2<Complex64>,
    /// Range bin centres in metres
    pub bins: Vec<f64>,
}

/// Range spectrum folded onto the device's physical grid,
/// indexed by `(grid row, grid column, range bin)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarCube(Array3<Complex64>);

impl RadarCube {
    pub fn data(&self) -> &Array3<Complex64> {
        &self.0
    }

    pub fn into_data(self) -> Array3<Complex64> {
        self.0
    }

    /// `(grid rows, grid columns, range bins)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.0.dim()
    }

    /// `(grid row, grid column)` slice for one range bin.
    pub fn range_slice(&self, bin: usize) -> ArrayView2<'_, Complex64> {
        self.0.index_axis(Axis(2), bin)
    }
}

/// FFT along the sample axis of every row, then zero the near-field bins.
///
/// The bin axis spans 0 to the configuration's maximum range over the
/// number of samples.
pub fn range_fft(
    signal: ArrayView2<'_, Complex64>,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
) -> RangeSpectrum {
    let samples = signal.ncols();
    let mut planner = FftPlanner::new();
    let mut spectrum = fft_along(signal, Axis(1), samples, &mut planner);
    zero_near_field(&mut spectrum, processing.near_field_bins);

    RangeSpectrum {
        spectrum,
        bins: linspace(0.0, config.max_range(), samples),
    }
}

/// Fold a `(virtual antenna, range bin)` spectrum onto the layout grid.
/// Empty grid cells are zero.
pub fn radar_cube(spectrum: &RangeSpectrum, layout: &AntennaLayout) -> Result<RadarCube> {
    let (antennas, bins) = spectrum.spectrum.dim();
    if antennas != layout.virtual_antennas {
        return Err(RadarError::shape(
            "radar cube",
            format!("{} virtual antennas", layout.virtual_antennas),
            format!("{antennas} rows"),
        ));
    }

    let cube = Array3::from_shape_fn((layout.rows, layout.cols, bins), |(r, c, n)| {
        layout
            .cell(r, c)
            .map_or(Complex64::new(0.0, 0.0), |v| spectrum.spectrum[[v, n]])
    });
    Ok(RadarCube(cube))
}

/// Mean magnitude across rows for every range bin.
pub fn range_profile(spectrum: &RangeSpectrum) -> Vec<f64> {
    let rows = spectrum.spectrum.nrows().max(1) as f64;
    spectrum
        .spectrum
        .map(|z| z.norm())
        .sum_axis(Axis(0))
        .iter()
        .map(|s| s / rows)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareParameters;
    use crate::device::DeviceModel;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn config() -> RadarConfiguration {
        RadarConfiguration::from_parameters(&HardwareParameters::iwr1843_default()).unwrap()
    }

    fn tone(rows: usize, samples: usize, bin: f64) -> Array2<Complex64> {
        Array2::from_shape_fn((rows, samples), |(_, n)| {
            Complex64::from_polar(1.0, 2.0 * PI * bin * n as f64 / samples as f64)
        })
    }

    #[test]
    fn test_near_field_bins_are_zero() {
        let signal = Array2::from_elem((12, 64), Complex64::new(3.0, -1.0)) + tone(12, 64, 3.0);
        let result = range_fft(signal.view(), &config(), &ProcessingConfig::default());
        for row in result.spectrum.rows() {
            assert!(row.iter().take(8).all(|z| *z == Complex64::new(0.0, 0.0)));
        }
    }

    #[test]
    fn test_tone_lands_in_its_bin() {
        let config = config();
        let result = range_fft(tone(2, 128, 20.0).view(), &config, &ProcessingConfig::default());
        let profile = range_profile(&result);
        let peak = profile
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, 20);
        assert_relative_eq!(profile[20], 128.0, max_relative = 1e-9);

        assert_eq!(result.bins.len(), 128);
        assert_eq!(result.bins[0], 0.0);
        assert_relative_eq!(result.bins[127], config.max_range(), max_relative = 1e-12);
        assert!(result.bins.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_radar_cube_mapping_iwr1843() {
        let layout = DeviceModel::Iwr1843.layout();
        let spectrum = RangeSpectrum {
            spectrum: Array2::from_shape_fn((12, 3), |(v, n)| {
                Complex64::new(v as f64, n as f64)
            }),
            bins: vec![0.0, 1.0, 2.0],
        };
        let cube = radar_cube(&spectrum, layout).unwrap();
        assert_eq!(cube.shape(), (2, 8, 3));

        let data = cube.data();
        assert_eq!(data[[0, 0, 1]], Complex64::new(0.0, 0.0));
        assert_eq!(data[[0, 2, 1]], Complex64::new(4.0, 1.0));
        assert_eq!(data[[1, 4, 2]], Complex64::new(8.0, 2.0));
        assert_eq!(data[[1, 7, 0]], Complex64::new(11.0, 0.0));
    }

    #[test]
    fn test_radar_cube_rejects_wrong_antenna_count() {
        let spectrum = RangeSpectrum {
            spectrum: Array2::zeros((8, 4)),
            bins: vec![0.0; 4],
        };
        assert!(matches!(
            radar_cube(&spectrum, DeviceModel::Iwr6843IskOds.layout()),
            Err(RadarError::Shape { .. })
        ));
    }
}
