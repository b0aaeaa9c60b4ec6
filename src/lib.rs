pub mod acquisition;
pub mod aoa;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod heatmap;
pub mod organize;
pub mod output;
pub mod pipeline;
pub mod session;
pub mod spectral;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::{HardwareParameters, ProcessingConfig, RadarConfiguration};
pub use device::DeviceModel;
pub use error::{RadarError, Result};
pub use heatmap::HeatmapKind;
pub use organize::RawFrame;
pub use pipeline::FrameProcessor;
pub use session::SessionRecord;
