//! Range-bin phase extraction.
//!
//! Small displacements of a reflector (chest wall, vibrating surface) show
//! up as phase changes at its range bin long before they move it to another
//! bin. These helpers pick the strongest bin of a reference antenna and
//! report every antenna's phase there.

use ndarray::Axis;

use super::range::{RangeSpectrum, range_fft};
use crate::config::{ProcessingConfig, RadarConfiguration};
use crate::error::{RadarError, Result};
use crate::organize::VirtualAntennaCube;

/// Phase in degrees of every row at the strongest bin of `reference_row`,
/// searching only the first `search_bins` range bins.
///
/// Returns the chosen bin alongside the phases.
pub fn chirp_phases(
    spectrum: &RangeSpectrum,
    reference_row: usize,
    search_bins: usize,
) -> Result<(usize, Vec<f64>)> {
    let (rows, bins) = spectrum.spectrum.dim();
    if reference_row >= rows {
        return Err(RadarError::shape(
            "phase reference antenna",
            format!("row below {rows}"),
            reference_row,
        ));
    }
    let search = search_bins.min(bins);
    if search == 0 {
        return Err(RadarError::shape("phase search window", "at least 1 bin", 0));
    }

    let reference = spectrum.spectrum.row(reference_row);
    let peak = reference
        .iter()
        .take(search)
        .enumerate()
        .max_by(|a, b| a.1.norm().total_cmp(&b.1.norm()))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let phases = spectrum
        .spectrum
        .column(peak)
        .iter()
        .map(|z| z.arg().to_degrees())
        .collect();
    Ok((peak, phases))
}

/// Per-antenna median phase over every chirp loop of a frame.
pub fn frame_phases(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    reference_antenna: usize,
    search_bins: usize,
) -> Result<Vec<f64>> {
    let mut per_antenna = vec![Vec::with_capacity(cube.loops()); cube.antennas()];
    for chirp in cube.data().axis_iter(Axis(0)) {
        let spectrum = range_fft(chirp, config, processing);
        let (_, phases) = chirp_phases(&spectrum, reference_antenna, search_bins)?;
        for (acc, phase) in per_antenna.iter_mut().zip(phases) {
            acc.push(phase);
        }
    }
    Ok(per_antenna.into_iter().map(median).collect())
}

/// Phase difference `later - earlier` in degrees, wrapped to (-180, 180].
pub fn phase_difference(later: f64, earlier: f64) -> f64 {
    let diff = (later - earlier).rem_euclid(360.0);
    if diff > 180.0 { diff - 360.0 } else { diff }
}

/// Wrapped differences between consecutive per-frame phase vectors.
pub fn phase_differences(frames: &[Vec<f64>]) -> Vec<Vec<f64>> {
    frames
        .windows(2)
        .map(|w| {
            w[1].iter()
                .zip(&w[0])
                .map(|(&b, &a)| phase_difference(b, a))
                .collect()
        })
        .collect()
}

fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
