use std::path::Path;

use serde::Deserialize;

use super::noise::NoiseConfig;
use crate::config::HardwareParameters;
use crate::device::DeviceModel;
use crate::error::{RadarError, Result};

/// Point reflector seen by the simulated radar.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Target {
    pub range_m: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    /// Radial velocity, positive moving away
    pub velocity_mps: f64,
    /// Peak amplitude in ADC counts
    pub amplitude: f64,
}

impl Default for Target {
    fn default() -> Self {
        Self {
            range_m: 1.0,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            velocity_mps: 0.0,
            amplitude: 1000.0,
        }
    }
}

impl Target {
    pub fn at_range(range_m: f64) -> Self {
        Self {
            range_m,
            ..Self::default()
        }
    }

    pub fn with_azimuth(mut self, azimuth_deg: f64) -> Self {
        self.azimuth_deg = azimuth_deg;
        self
    }

    pub fn with_elevation(mut self, elevation_deg: f64) -> Self {
        self.elevation_deg = elevation_deg;
        self
    }

    pub fn with_velocity(mut self, velocity_mps: f64) -> Self {
        self.velocity_mps = velocity_mps;
        self
    }

    pub fn with_amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }
}

/// Scene file for the session generator.
#[derive(Clone, Debug, Deserialize)]
pub struct SceneConfig {
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_device")]
    pub device: DeviceModel,
    #[serde(default = "default_frames")]
    pub frames: usize,
    /// Hardware parameters; the IWR1843 defaults when absent
    pub hardware: Option<HardwareParameters>,
    #[serde(default)]
    pub targets: Vec<Target>,
    #[serde(default)]
    pub noise: NoiseConfig,
}

fn default_description() -> String {
    "simulated scene".to_string()
}

fn default_device() -> DeviceModel {
    DeviceModel::Iwr1843
}

fn default_frames() -> usize {
    10
}

impl SceneConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| RadarError::Config(format!("invalid scene file: {e}")))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    pub fn hardware_parameters(&self) -> HardwareParameters {
        self.hardware
            .clone()
            .unwrap_or_else(HardwareParameters::iwr1843_default)
    }
}
