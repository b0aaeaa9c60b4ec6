//! Heatmap assemblers.
//!
//! Each assembler composes the spectral transforms over a whole
//! [`VirtualAntennaCube`] and returns a [`SpectralMatrix`] whose columns are
//! range bins. Nothing here renders.

use std::fmt;

use ndarray::{Array2, Array3, Axis, s};
use num_complex::Complex64;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::aoa::{SteeringVectorSet, aoa_capon, music_spectrum};
use crate::config::{ProcessingConfig, RadarConfiguration};
use crate::device::AntennaLayout;
use crate::error::{RadarError, Result};
use crate::organize::VirtualAntennaCube;
use crate::spectral::{
    BinAxis, Quantity, RangeSpectrum, SpectralMatrix, angle_fft, arcsine_bins, fft_along,
    fftshift, line_angle_fft, linspace, radar_cube, range_fft, zero_near_field,
};

/// Heatmap produced per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HeatmapKind {
    /// Chirp x range
    Range,
    /// Doppler x range
    DopplerRange,
    /// Doppler x range from the zero-padded 2-D FFT, averaged over antennas
    DopplerRangePadded,
    /// Azimuth x range from the horizontal baseline FFT
    AzimuthRange,
    /// Elevation x range from the vertical baseline FFT
    ElevationRange,
    /// Azimuth x range from the 2-D FFT over the antenna grid
    AzimuthGrid,
    /// Elevation x range from the 2-D FFT over the antenna grid
    ElevationGrid,
    /// Azimuth x range from Capon beamforming
    CaponRange,
    /// Azimuth x range from the MUSIC pseudo-spectrum
    MusicRange,
}

impl fmt::Display for HeatmapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Range => "range",
            Self::DopplerRange => "doppler-range",
            Self::DopplerRangePadded => "doppler-range-padded",
            Self::AzimuthRange => "azimuth-range",
            Self::ElevationRange => "elevation-range",
            Self::AzimuthGrid => "azimuth-grid",
            Self::ElevationGrid => "elevation-grid",
            Self::CaponRange => "capon-range",
            Self::MusicRange => "music-range",
        };
        f.write_str(name)
    }
}

fn range_axis(spectrum: &RangeSpectrum) -> BinAxis {
    BinAxis::new(Quantity::Range, spectrum.bins.clone())
}

fn check_layout(cube: &VirtualAntennaCube, layout: &AntennaLayout) -> Result<()> {
    if cube.antennas() != layout.virtual_antennas {
        return Err(RadarError::shape(
            "heatmap antenna layout",
            format!("{} virtual antennas", layout.virtual_antennas),
            cube.antennas(),
        ));
    }
    Ok(())
}

/// Range FFT of every chirp loop, `(loop, antenna, range bin)`.
fn range_fft_per_loop(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
) -> (Array3<Complex64>, Vec<f64>) {
    let (loops, antennas, samples) = cube.shape();
    let mut out = Array3::zeros((loops, antennas, samples));
    let mut bins = linspace(0.0, config.max_range(), samples);
    for (l, mut plane) in out.axis_iter_mut(Axis(0)).enumerate() {
        let spectrum = range_fft(cube.chirp(l), config, processing);
        plane.assign(&spectrum.spectrum);
        bins = spectrum.bins;
    }
    (out, bins)
}

/// Chirp x range map of the antenna-averaged signal.
pub fn range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
) -> Result<SpectralMatrix<Complex64>> {
    let averaged = cube.mean_over_antennas();
    let spectrum = range_fft(averaged.view(), config, processing);
    let chirps = (0..cube.loops()).map(|l| l as f64).collect();
    SpectralMatrix::new(
        BinAxis::new(Quantity::Chirp, chirps),
        range_axis(&spectrum),
        spectrum.spectrum,
    )
}

/// Doppler x range map: a centred FFT along the chirp axis of every range
/// column of [`range_heatmap`].
pub fn doppler_range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
) -> Result<SpectralMatrix<Complex64>> {
    let averaged = cube.mean_over_antennas();
    let spectrum = range_fft(averaged.view(), config, processing);
    let loops = cube.loops();

    let mut planner = FftPlanner::new();
    let mut doppler = fft_along(spectrum.spectrum.view(), Axis(0), loops, &mut planner);
    fftshift(&mut doppler, Axis(0));

    SpectralMatrix::new(
        BinAxis::new(
            Quantity::Doppler,
            linspace(-config.max_doppler(), config.max_doppler(), loops),
        ),
        range_axis(&spectrum),
        doppler,
    )
}

/// Mean line-FFT magnitude over several antenna lines, `(angle bin, range bin)`.
fn line_heatmap(
    spectrum: &RangeSpectrum,
    lines: &[Vec<usize>],
    bins: usize,
    context: &'static str,
) -> Result<Array2<f64>> {
    let range_bins = spectrum.spectrum.ncols();
    let lines: Vec<&Vec<usize>> = lines.iter().filter(|l| !l.is_empty()).collect();
    if lines.is_empty() {
        return Err(RadarError::shape(context, "at least one antenna line", 0));
    }

    let mut matrix = Array2::<f64>::zeros((bins, range_bins));
    for line in &lines {
        let rows = spectrum.spectrum.select(Axis(0), line);
        for (bin, mut out) in matrix.axis_iter_mut(Axis(1)).enumerate() {
            let magnitude = line_angle_fft(rows.column(bin), bins)?;
            for (acc, m) in out.iter_mut().zip(magnitude) {
                *acc += m;
            }
        }
    }
    let count = lines.len() as f64;
    matrix.mapv_inplace(|m| m / count);
    Ok(matrix)
}

/// Azimuth x range map from FFTs along the horizontal baseline rows of the
/// chirp-averaged range spectrum.
pub fn azimuth_range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    layout: &AntennaLayout,
) -> Result<SpectralMatrix> {
    check_layout(cube, layout)?;
    let averaged = cube.mean_over_loops();
    let spectrum = range_fft(averaged.view(), config, processing);
    let lines: Vec<Vec<usize>> = layout
        .azimuth_rows
        .iter()
        .map(|&r| layout.row_antennas(r))
        .collect();
    let bins = processing.azimuth_bins;
    let matrix = line_heatmap(&spectrum, &lines, bins, "azimuth heatmap")?;
    SpectralMatrix::new(
        BinAxis::new(Quantity::Azimuth, arcsine_bins(bins)),
        range_axis(&spectrum),
        matrix,
    )
}

/// Elevation x range map from FFTs along the vertical baseline columns.
pub fn elevation_range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    layout: &AntennaLayout,
) -> Result<SpectralMatrix> {
    check_layout(cube, layout)?;
    let averaged = cube.mean_over_loops();
    let spectrum = range_fft(averaged.view(), config, processing);
    let lines: Vec<Vec<usize>> = layout
        .elevation_cols
        .iter()
        .map(|&c| layout.col_antennas(c))
        .collect();
    let bins = processing.elevation_bins;
    let matrix = line_heatmap(&spectrum, &lines, bins, "elevation heatmap")?;
    SpectralMatrix::new(
        BinAxis::new(Quantity::Elevation, arcsine_bins(bins)),
        range_axis(&spectrum),
        matrix,
    )
}

/// Azimuth x range and elevation x range maps from the 2-D FFT over the
/// full antenna grid.
pub fn grid_angle_heatmaps(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    layout: &AntennaLayout,
) -> Result<(SpectralMatrix, SpectralMatrix)> {
    check_layout(cube, layout)?;
    let averaged = cube.mean_over_loops();
    let spectrum = range_fft(averaged.view(), config, processing);
    let angles = angle_fft(&radar_cube(&spectrum, layout)?, processing)?;

    let azimuth = SpectralMatrix::new(
        BinAxis::new(Quantity::Azimuth, angles.azimuth_bins),
        range_axis(&spectrum),
        angles.azimuth,
    )?;
    let elevation = SpectralMatrix::new(
        BinAxis::new(Quantity::Elevation, angles.elevation_bins),
        range_axis(&spectrum),
        angles.elevation,
    )?;
    Ok((azimuth, elevation))
}

/// Capon azimuth x range map over the layout's azimuth array.
///
/// Every range bin beyond the near field gets its own `(antenna, chirp)`
/// covariance; near-field columns are zero.
pub fn capon_range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    layout: &AntennaLayout,
    steering: &SteeringVectorSet,
) -> Result<SpectralMatrix> {
    check_layout(cube, layout)?;
    let (spectra, bins) = range_fft_per_loop(cube, config, processing);
    let antennas = layout.azimuth_array();
    let selected = spectra.select(Axis(1), &antennas);

    let range_bins = bins.len();
    let mut matrix = Array2::<f64>::zeros((steering.num_angles(), range_bins));
    for bin in processing.near_field_bins.min(range_bins)..range_bins {
        // (antenna, chirp)
        let slice = selected.slice(s![.., .., bin]).reversed_axes();
        let spectrum = aoa_capon(slice, steering)?;
        for (out, p) in matrix.column_mut(bin).iter_mut().zip(&spectrum.power) {
            *out = p.norm();
        }
    }
    log::debug!(
        "Capon heatmap over {} antennas, {range_bins} range bins",
        antennas.len()
    );

    SpectralMatrix::new(
        BinAxis::new(Quantity::Azimuth, steering.azimuths_deg()),
        BinAxis::new(Quantity::Range, bins),
        matrix,
    )
}

/// MUSIC azimuth x range map of the chirp-averaged azimuth array.
pub fn music_range_heatmap(
    cube: &VirtualAntennaCube,
    config: &RadarConfiguration,
    processing: &ProcessingConfig,
    layout: &AntennaLayout,
    steering: &SteeringVectorSet,
) -> Result<SpectralMatrix> {
    check_layout(cube, layout)?;
    let averaged = cube.mean_over_loops();
    let spectrum = range_fft(averaged.view(), config, processing);
    let selected = spectrum.spectrum.select(Axis(0), &layout.azimuth_array());

    let mut matrix = music_spectrum(selected.view(), steering)?.reversed_axes();
    zero_near_field(&mut matrix, processing.near_field_bins);

    SpectralMatrix::new(
        BinAxis::new(Quantity::Azimuth, steering.azimuths_deg()),
        range_axis(&spectrum),
        matrix,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareParameters;
    use crate::device::DeviceModel;
    use std::f64::consts::PI;

    fn config(samples: usize, loops: usize) -> RadarConfiguration {
        let mut params = HardwareParameters::iwr1843_default();
        params.insert("ADC_SAMPLES", samples as f64);
        params.insert("CHIRP_LOOPS", loops as f64);
        RadarConfiguration::from_parameters(&params).unwrap()
    }

    /// Target at `range_bin`, moving `doppler_bin` per loop, arriving with
    /// `sin(theta)` across the IWR1843 azimuth row.
    fn target_cube(
        loops: usize,
        samples: usize,
        range_bin: f64,
        doppler_bin: f64,
        sin_theta: f64,
    ) -> VirtualAntennaCube {
        let azimuth = DeviceModel::Iwr1843.layout().azimuth_array();
        VirtualAntennaCube::from_array(Array3::from_shape_fn(
            (loops, 12, samples),
            |(l, v, n)| {
                let position = azimuth.iter().position(|&a| a == v).unwrap_or(2) as f64;
                let phase = 2.0
                    * PI
                    * (range_bin * n as f64 / samples as f64
                        + doppler_bin * l as f64 / loops as f64)
                    + PI * position * sin_theta;
                Complex64::from_polar(1.0, phase)
            },
        ))
    }

    fn column_peak(matrix: &SpectralMatrix, col: usize) -> usize {
        matrix
            .values()
            .column(col)
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_range_heatmap_axes() {
        let config = config(64, 8);
        let cube = target_cube(8, 64, 20.0, 0.0, 0.0);
        let map = range_heatmap(&cube, &config, &ProcessingConfig::default()).unwrap();
        assert_eq!(map.values().dim(), (8, 64));
        assert_eq!(map.rows().values, (0..8).map(|l| l as f64).collect::<Vec<_>>());
        let (_, col, _) = map.magnitude().peak().unwrap();
        assert_eq!(col, 20);
    }

    #[test]
    fn test_doppler_range_heatmap_peak() {
        let config = config(64, 16);
        let cube = target_cube(16, 64, 20.0, 3.0, 0.0);
        let map = doppler_range_heatmap(&cube, &config, &ProcessingConfig::default()).unwrap();
        assert_eq!(map.values().dim(), (16, 64));
        let (row, col, _) = map.magnitude().peak().unwrap();
        assert_eq!((row, col), (8 + 3, 20));
        assert!(map.rows().values[0] < 0.0);
    }

    #[test]
    fn test_azimuth_heatmap_finds_angle() {
        let config = config(64, 4);
        let layout = DeviceModel::Iwr1843.layout();
        let cube = target_cube(4, 64, 16.0, 0.0, 0.5);
        let map =
            azimuth_range_heatmap(&cube, &config, &ProcessingConfig::default(), layout).unwrap();
        assert_eq!(map.values().dim(), (64, 64));
        let peak = column_peak(&map, 16);
        assert!((map.rows().values[peak] - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_elevation_heatmap_shape() {
        let config = config(32, 4);
        let layout = DeviceModel::Iwr6843IskOds.layout();
        let cube = target_cube(4, 32, 10.0, 0.0, 0.0);
        let map =
            elevation_range_heatmap(&cube, &config, &ProcessingConfig::default(), layout).unwrap();
        assert_eq!(map.values().dim(), (32, 32));
        assert_eq!(map.rows().quantity, Quantity::Elevation);
    }

    #[test]
    fn test_grid_heatmaps_shapes() {
        let config = config(32, 4);
        let layout = DeviceModel::Iwr6843IskOds.layout();
        let cube = target_cube(4, 32, 10.0, 0.0, 0.0);
        let (azimuth, elevation) =
            grid_angle_heatmaps(&cube, &config, &ProcessingConfig::default(), layout).unwrap();
        assert_eq!(azimuth.values().dim(), (64, 32));
        assert_eq!(elevation.values().dim(), (32, 32));
    }

    #[test]
    fn test_heatmaps_reject_wrong_layout() {
        let config = config(32, 4);
        let cube = VirtualAntennaCube::from_array(Array3::zeros((4, 8, 32)));
        let layout = DeviceModel::Iwr1843.layout();
        assert!(matches!(
            azimuth_range_heatmap(&cube, &config, &ProcessingConfig::default(), layout),
            Err(RadarError::Shape { .. })
        ));
    }

    #[test]
    fn test_music_heatmap_finds_angle() {
        let config = config(64, 4);
        let layout = DeviceModel::Iwr1843.layout();
        let steering = SteeringVectorSet::uniform_linear(8, 90.0, 1.0).unwrap();
        let cube = target_cube(4, 64, 16.0, 0.0, 25.3f64.to_radians().sin());
        let processing = ProcessingConfig::default();
        let map = music_range_heatmap(&cube, &config, &processing, layout, &steering).unwrap();
        assert_eq!(map.values().dim(), (181, 64));
        assert!(map.values().column(0).iter().all(|&v| v == 0.0));
        let peak = column_peak(&map, 16);
        assert_eq!(map.rows().values[peak], 25.0);
    }
}
