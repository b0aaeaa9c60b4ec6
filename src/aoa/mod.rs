//! Angle-of-arrival estimation.
//!
//! Steering vectors use the convention `a_n(theta) = exp(+j 2 pi x_n sin(theta) / lambda)`,
//! matching the sign the angle FFTs resolve to positive angles.

pub mod capon;
pub mod covariance;
pub mod music;
pub mod steering;

pub use capon::{CaponSpectrum, aoa_capon};
pub use covariance::{cov_matrix, forward_backward_avg};
pub use music::music_spectrum;
pub use steering::{SteeringAngle, SteeringVectorSet};
