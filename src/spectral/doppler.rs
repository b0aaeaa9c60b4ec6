use ndarray::{Array2, Axis};
use rustfft::FftPlanner;

use super::{BinAxis, Quantity, SpectralMatrix, fft2, fftshift, linspace, zero_near_field};
use crate::config::{ProcessingConfig, RadarConfiguration};
use crate::error::Result;
use crate::organize::VirtualAntennaCube;

/// Range-Doppler magnitude map of a virtual antenna cube.
///
/// Each antenna's `(loop, sample)` plane is transformed with both axes
/// zero-padded by the configured factor; magnitudes are averaged across
/// antennas, the loop axis is centred on zero Doppler, and the padded
/// near-field range bins are cleared. Rows run from `-max_doppler` to
/// `+max_doppler`, columns from 0 to `max_range`.
pub fn doppler_fft(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
) -> Result<SpectralMatrix> {
    let (loops, antennas, samples) = cube.shape();
    let padding = processing.doppler_padding;
    let (rows, cols) = (loops * padding, samples * padding);

    let mut planner = FftPlanner::new();
    let mut magnitude = Array2::<f64>::zeros((rows, cols));
    for antenna in 0..antennas {
        let spectrum = fft2(cube.antenna(antenna), rows, cols, &mut planner);
        magnitude.zip_mut_with(&spectrum, |acc, z| *acc += z.norm());
    }
    if antennas > 0 {
        magnitude.mapv_inplace(|m| m / antennas as f64);
    }

    fftshift(&mut magnitude, Axis(0));
    zero_near_field(&mut magnitude, processing.near_field_bins * padding);

    SpectralMatrix::new(
        BinAxis::new(
            Quantity::Doppler,
            linspace(-config.max_doppler(), config.max_doppler(), rows),
        ),
        BinAxis::new(Quantity::Range, linspace(0.0, config.max_range(), cols)),
        magnitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareParameters;
    use ndarray::Array3;
    use num_complex::Complex64;
    use std::f64::consts::PI;

    #[test]
    fn test_moving_target_peaks_off_centre() {
        let config =
            RadarConfiguration::from_parameters(&HardwareParameters::iwr1843_default()).unwrap();
        let processing = ProcessingConfig::default();
        let (loops, antennas, samples) = (16, 4, 32);
        let (range_bin, doppler_bin) = (12.0, 3.0);

        let cube = VirtualAntennaCube::from_array(Array3::from_shape_fn(
            (loops, antennas, samples),
            |(l, _, n)| {
                let phase = 2.0 * PI
                    * (range_bin * n as f64 / samples as f64 + doppler_bin * l as f64 / loops as f64);
                Complex64::from_polar(1.0, phase)
            },
        ));

        let map = doppler_fft(&cube, &config, &processing).unwrap();
        assert_eq!(map.values().dim(), (64, 128));
        assert_eq!(map.rows().len(), 64);
        assert!(map.rows().is_strictly_increasing());
        assert!(map.values().column(31).iter().all(|&m| m == 0.0));

        let (row, col, _) = map.peak().unwrap();
        assert_eq!(col, (range_bin as usize) * 4);
        assert_eq!(row, 32 + (doppler_bin as usize) * 4);
    }
}
