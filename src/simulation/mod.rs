//! Synthetic FMCW frames for tests and demo sessions.

mod frame;
mod noise;
mod scene;

pub use frame::FrameGenerator;
pub use noise::{AdditiveNoiseConfig, NoiseConfig, PhaseNoiseConfig, apply_noise, signal_power};
pub use scene::{SceneConfig, Target};
