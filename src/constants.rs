//! Physical constants and processing defaults
//!
//! The near-field and zero-padding values are defaults for
//! [`ProcessingConfig`](crate::config::ProcessingConfig); override them
//! there rather than editing these literals.

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Leading range bins zeroed after every range FFT (near-field and DC leakage).
pub const NEAR_FIELD_BINS: usize = 8;

/// Zero-padding factor applied to both axes of the range-Doppler FFT.
pub const DOPPLER_PADDING: usize = 4;

/// Default number of azimuth FFT bins.
pub const AZIMUTH_BINS: usize = 64;

/// Default number of elevation FFT bins.
pub const ELEVATION_BINS: usize = 32;

/// Default half-width of the Capon/MUSIC angle scan in degrees.
pub const ANGLE_RANGE_DEG: f64 = 90.0;

/// Default Capon/MUSIC angle scan step in degrees.
pub const ANGLE_RESOLUTION_DEG: f64 = 1.0;

/// Fraction of the maximum range considered unambiguous.
pub const UNAMBIGUOUS_RANGE_FRACTION: f64 = 0.9;

/// Relative eigenvalue floor below which a covariance matrix is treated as singular.
/// Compared against `min_eigenvalue / max_eigenvalue`.
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Iteration limit for the Hermitian eigensolver.
pub const EIGEN_MAX_ITERATIONS: usize = 1000;
