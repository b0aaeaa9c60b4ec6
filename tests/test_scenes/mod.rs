use mmwave_radar::simulation::{FrameGenerator, NoiseConfig, Target};
use mmwave_radar::{DeviceModel, HardwareParameters, RadarConfiguration, RawFrame};

/// IWR1843 parameters cut down to 16 loops of 64 samples.
pub fn small_parameters() -> HardwareParameters {
    let mut params = HardwareParameters::iwr1843_default();
    params.insert("ADC_SAMPLES", 64.0);
    params.insert("CHIRP_LOOPS", 16.0);
    params
}

pub fn small_config() -> RadarConfiguration {
    RadarConfiguration::from_parameters(&small_parameters()).unwrap()
}

/// Noisy frames of the given targets, seeded.
pub fn simulate(device: DeviceModel, targets: Vec<Target>, frames: usize) -> Vec<RawFrame> {
    let noise = NoiseConfig::default().with_seed(1234).with_awgn(20.0);
    FrameGenerator::new(small_config(), device, targets, noise)
        .unwrap()
        .frames(frames)
        .unwrap()
}

pub fn argmax(values: impl IntoIterator<Item = f64>) -> usize {
    values
        .into_iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
        .unwrap()
}
