use std::f64::consts::PI;

use ndarray::{Array3, s};
use num_complex::Complex64;
use rand_chacha::ChaCha8Rng;

use super::noise::{NoiseConfig, apply_noise};
use super::scene::Target;
use crate::config::RadarConfiguration;
use crate::device::{AntennaLayout, DeviceModel};
use crate::error::{RadarError, Result};
use crate::organize::{IqLayout, RawFrame};

/// Produces raw frames as the capture card would deliver them for a set of
/// point targets.
///
/// Targets land on the processing range axis (`range / range_resolution`
/// bins) and the Doppler axis (`velocity / doppler_resolution` bins). The
/// board's RX phase inversion is applied so the normal pipeline undoes it.
pub struct FrameGenerator {
    radar: RadarConfiguration,
    layout: &'static AntennaLayout,
    targets: Vec<Target>,
    noise: NoiseConfig,
    iq_layout: IqLayout,
    rng: ChaCha8Rng,
    frame_index: usize,
}

impl FrameGenerator {
    pub fn new(
        radar: RadarConfiguration,
        device: DeviceModel,
        targets: Vec<Target>,
        noise: NoiseConfig,
    ) -> Result<Self> {
        let layout = device.layout();
        if radar.virtual_antennas() != layout.virtual_antennas {
            return Err(RadarError::shape(
                "simulated device",
                format!("{} virtual antennas for {device}", layout.virtual_antennas),
                radar.virtual_antennas(),
            ));
        }
        Ok(Self {
            rng: noise.rng(),
            radar,
            layout,
            targets,
            noise,
            iq_layout: IqLayout::default(),
            frame_index: 0,
        })
    }

    pub fn with_iq_layout(mut self, iq_layout: IqLayout) -> Self {
        self.iq_layout = iq_layout;
        self
    }

    /// Noise-free `(chirp, rx, sample)` cube for a frame, before the RX
    /// inversion.
    pub fn clean_cube(&self, frame_index: usize) -> Array3<Complex64> {
        let radar = &self.radar;
        let (tx_count, rx_count) = (radar.tx_antennas(), radar.rx_antennas());
        let samples = radar.adc_samples();
        let elapsed_s = frame_index as f64 * radar.periodicity_ms() / 1e3;
        let spacing = self.layout.spacing_wavelengths;

        let mut cube = Array3::zeros((radar.chirps_per_frame(), rx_count, samples));
        for target in &self.targets {
            let range = target.range_m + target.velocity_mps * elapsed_s;
            let range_cycles = range / radar.range_resolution() / samples as f64;
            let doppler_cycles =
                2.0 * target.velocity_mps * radar.chirp_separation_s() / radar.wavelength_m();
            let (az, el) = (
                target.azimuth_deg.to_radians(),
                target.elevation_deg.to_radians(),
            );

            for ((chirp, rx, n), z) in cube.indexed_iter_mut() {
                let (l, tx) = (chirp / tx_count, chirp % tx_count);
                let (row, col) = self
                    .layout
                    .position(tx * rx_count + rx)
                    .unwrap_or((0, 0));
                let (x, y) = (col as f64 * spacing, row as f64 * spacing);
                let spatial = x * az.sin() * el.cos() + y * el.sin();
                let phase =
                    2.0 * PI * (range_cycles * n as f64 + doppler_cycles * l as f64 + spatial);
                *z += Complex64::from_polar(target.amplitude, phase);
            }
        }
        cube
    }

    /// Next frame with noise, RX inversion and 16-bit quantization.
    pub fn next_frame(&mut self) -> Result<RawFrame> {
        let mut cube = self.clean_cube(self.frame_index);
        apply_noise(&mut cube, &self.noise, &mut self.rng)?;
        for &rx in self.layout.inverted_rx {
            if rx < cube.dim().1 {
                cube.slice_mut(s![.., rx, ..]).mapv_inplace(|z| -z);
            }
        }
        self.frame_index += 1;
        encode(&cube, self.iq_layout)
    }

    pub fn frames(&mut self, count: usize) -> Result<Vec<RawFrame>> {
        (0..count).map(|_| self.next_frame()).collect()
    }
}

fn quantize(x: f64) -> i16 {
    x.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

fn encode(cube: &Array3<Complex64>, iq_layout: IqLayout) -> Result<RawFrame> {
    let samples: Vec<Complex64> = cube.iter().copied().collect();
    let mut words = Vec::with_capacity(samples.len() * 2);
    match iq_layout {
        IqLayout::Interleaved => {
            for z in &samples {
                words.extend([quantize(z.re), quantize(z.im)]);
            }
        }
        IqLayout::Dca1000Lvds => {
            if samples.len() % 2 != 0 {
                return Err(RadarError::shape(
                    "DCA1000 LVDS frame",
                    "an even number of samples",
                    samples.len(),
                ));
            }
            for pair in samples.chunks_exact(2) {
                words.extend([
                    quantize(pair[0].re),
                    quantize(pair[1].re),
                    quantize(pair[0].im),
                    quantize(pair[1].im),
                ]);
            }
        }
    }
    Ok(RawFrame::new(words))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareParameters;
    use crate::organize::organize_with_layout;

    fn radar() -> RadarConfiguration {
        let mut params = HardwareParameters::iwr1843_default();
        params.insert("ADC_SAMPLES", 64.0);
        params.insert("CHIRP_LOOPS", 8.0);
        RadarConfiguration::from_parameters(&params).unwrap()
    }

    #[test]
    fn test_frame_length_and_determinism() {
        let noise = NoiseConfig::default().with_seed(5).with_awgn(20.0);
        let targets = vec![Target::at_range(2.0)];
        let mut a =
            FrameGenerator::new(radar(), DeviceModel::Iwr1843, targets.clone(), noise.clone())
                .unwrap();
        let mut b = FrameGenerator::new(radar(), DeviceModel::Iwr1843, targets, noise).unwrap();
        let frame = a.next_frame().unwrap();
        assert_eq!(frame.len(), radar().raw_frame_len());
        assert_eq!(frame, b.next_frame().unwrap());
    }

    #[test]
    fn test_layouts_decode_to_same_cube() {
        let radar = radar();
        let targets = vec![Target::at_range(1.5).with_azimuth(10.0)];
        let mut interleaved = FrameGenerator::new(
            radar.clone(),
            DeviceModel::Iwr6843IskOds,
            targets.clone(),
            NoiseConfig::default(),
        )
        .unwrap();
        let mut lvds = FrameGenerator::new(
            radar.clone(),
            DeviceModel::Iwr6843IskOds,
            targets,
            NoiseConfig::default(),
        )
        .unwrap()
        .with_iq_layout(IqLayout::Dca1000Lvds);

        let dims = (radar.chirps_per_frame(), radar.rx_antennas(), radar.adc_samples());
        let a = organize_with_layout(
            &interleaved.next_frame().unwrap(),
            dims.0,
            dims.1,
            dims.2,
            IqLayout::Interleaved,
        )
        .unwrap();
        let b = organize_with_layout(
            &lvds.next_frame().unwrap(),
            dims.0,
            dims.1,
            dims.2,
            IqLayout::Dca1000Lvds,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rx_inversion_applied() {
        let radar = radar();
        let mut generator = FrameGenerator::new(
            radar.clone(),
            DeviceModel::Iwr6843IskOds,
            vec![Target::at_range(1.0)],
            NoiseConfig::default(),
        )
        .unwrap();
        let clean = generator.clean_cube(0);
        let frame = generator.next_frame().unwrap();
        let cube = organize_with_layout(
            &frame,
            radar.chirps_per_frame(),
            radar.rx_antennas(),
            radar.adc_samples(),
            IqLayout::Interleaved,
        )
        .unwrap();
        // RX 1 is inverted on this board
        let (raw, expected) = (cube.data()[[0, 1, 5]], -clean[[0, 1, 5]]);
        assert!((raw - expected).norm() < 1.0);
    }

    #[test]
    fn test_rejects_mismatched_device() {
        let mut params = HardwareParameters::iwr1843_default();
        params.insert("TX2_EN", 0.0);
        let radar = RadarConfiguration::from_parameters(&params).unwrap();
        let generator =
            FrameGenerator::new(radar, DeviceModel::Iwr1843, vec![], NoiseConfig::default());
        assert!(generator.is_err());
    }
}
