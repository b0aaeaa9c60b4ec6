use std::f64::consts::PI;

use nalgebra::DVector;
use ndarray::{Array2, ArrayView1};
use num_complex::Complex64;

use crate::error::{RadarError, Result};

/// Direction a steering vector points at, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringAngle {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

/// Precomputed array response for a grid of candidate angles.
///
/// `vectors` is `(angle, antenna)`. Build once per geometry and wavelength,
/// then reuse across range bins and frames.
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringVectorSet {
    angles: Vec<SteeringAngle>,
    vectors: Array2<Complex64>,
}

impl SteeringVectorSet {
    /// Uniform half-wavelength linear array scanned from `-angle_range_deg`
    /// to `+angle_range_deg` in steps of `resolution_deg`.
    pub fn uniform_linear(
        num_antennas: usize,
        angle_range_deg: f64,
        resolution_deg: f64,
    ) -> Result<Self> {
        if !(angle_range_deg > 0.0) || !(resolution_deg > 0.0) {
            return Err(RadarError::Config(format!(
                "steering scan needs positive range and resolution, got {angle_range_deg} / {resolution_deg}"
            )));
        }
        let count = (2.0 * angle_range_deg / resolution_deg).round() as usize + 1;
        let azimuths: Vec<f64> = (0..count)
            .map(|k| -angle_range_deg + k as f64 * resolution_deg)
            .collect();
        // Positions in wavelengths with a wavelength of one
        let positions: Vec<f64> = (0..num_antennas).map(|n| 0.5 * n as f64).collect();
        Self::linear(&positions, 1.0, &azimuths)
    }

    /// Linear array with element positions in metres.
    pub fn linear(positions_m: &[f64], wavelength_m: f64, azimuths_deg: &[f64]) -> Result<Self> {
        if positions_m.is_empty() {
            return Err(RadarError::shape("steering vectors", "at least 1 antenna", 0));
        }
        if wavelength_m <= 0.0 {
            return Err(RadarError::Config("wavelength must be positive".into()));
        }
        let k = 2.0 * PI / wavelength_m;
        let vectors = Array2::from_shape_fn((azimuths_deg.len(), positions_m.len()), |(a, n)| {
            Complex64::from_polar(1.0, k * positions_m[n] * azimuths_deg[a].to_radians().sin())
        });
        let angles = azimuths_deg
            .iter()
            .map(|&azimuth_deg| SteeringAngle {
                azimuth_deg,
                elevation_deg: 0.0,
            })
            .collect();
        Ok(Self { angles, vectors })
    }

    /// Planar array with `(horizontal, vertical)` element positions in metres.
    ///
    /// Angle index `m * elevations.len() + p` holds azimuth `m`, elevation `p`.
    pub fn planar(
        positions_m: &[(f64, f64)],
        wavelength_m: f64,
        azimuths_deg: &[f64],
        elevations_deg: &[f64],
    ) -> Result<Self> {
        if positions_m.is_empty() {
            return Err(RadarError::shape("steering vectors", "at least 1 antenna", 0));
        }
        if wavelength_m <= 0.0 {
            return Err(RadarError::Config("wavelength must be positive".into()));
        }
        let k = 2.0 * PI / wavelength_m;
        let angles: Vec<SteeringAngle> = azimuths_deg
            .iter()
            .flat_map(|&azimuth_deg| {
                elevations_deg.iter().map(move |&elevation_deg| SteeringAngle {
                    azimuth_deg,
                    elevation_deg,
                })
            })
            .collect();
        let vectors = Array2::from_shape_fn((angles.len(), positions_m.len()), |(a, n)| {
            let (theta, phi) = (
                angles[a].azimuth_deg.to_radians(),
                angles[a].elevation_deg.to_radians(),
            );
            let (x, z) = positions_m[n];
            Complex64::from_polar(1.0, k * (x * theta.sin() * phi.cos() + z * phi.sin()))
        });
        Ok(Self { angles, vectors })
    }

    pub fn angles(&self) -> &[SteeringAngle] {
        &self.angles
    }

    pub fn azimuths_deg(&self) -> Vec<f64> {
        self.angles.iter().map(|a| a.azimuth_deg).collect()
    }

    /// `(angle, antenna)`
    pub fn vectors(&self) -> &Array2<Complex64> {
        &self.vectors
    }

    pub fn vector(&self, angle: usize) -> ArrayView1<'_, Complex64> {
        self.vectors.row(angle)
    }

    /// Steering vector for one angle as a column for matrix products.
    pub(crate) fn column(&self, angle: usize) -> DVector<Complex64> {
        let row = self.vectors.row(angle);
        DVector::from_iterator(row.len(), row.iter().copied())
    }

    pub fn num_angles(&self) -> usize {
        self.vectors.nrows()
    }

    pub fn num_antennas(&self) -> usize {
        self.vectors.ncols()
    }
}
