//! Per-frame processing: raw words in, assembled matrices out.

use crate::aoa::SteeringVectorSet;
use crate::config::{ProcessingConfig, RadarConfiguration};
use crate::device::DeviceModel;
use crate::error::Result;
use crate::heatmap::{
    HeatmapKind, azimuth_range_heatmap, capon_range_heatmap, doppler_range_heatmap,
    elevation_range_heatmap, grid_angle_heatmaps, music_range_heatmap, range_heatmap,
};
use crate::organize::{
    IqLayout, RawFrame, VirtualAntennaCube, organize_with_layout, separate_by_tx,
};
use crate::spectral::{
    SpectralMatrix, doppler_fft, find_peaks, frame_phases, range_fft, range_profile,
};

/// Antenna-averaged range magnitude of the first chirp loop.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeProfile {
    /// Range bin centres in metres
    pub bins: Vec<f64>,
    pub magnitude: Vec<f64>,
}

impl RangeProfile {
    /// `(range, magnitude)` of every bin above `threshold`.
    pub fn peaks(&self, threshold: f64) -> Vec<(f64, f64)> {
        find_peaks(&self.magnitude, threshold)
            .into_iter()
            .map(|i| (self.bins[i], self.magnitude[i]))
            .collect()
    }
}

/// Stateless frame processor for one radar configuration and device.
pub struct FrameProcessor {
    radar: RadarConfiguration,
    processing: ProcessingConfig,
    device: DeviceModel,
    iq_layout: IqLayout,
    steering: SteeringVectorSet,
}

impl FrameProcessor {
    pub fn new(
        radar: RadarConfiguration,
        processing: ProcessingConfig,
        device: DeviceModel,
    ) -> Result<Self> {
        processing.validate()?;
        let steering = SteeringVectorSet::uniform_linear(
            device.layout().azimuth_array().len(),
            processing.angle_range_deg,
            processing.angle_resolution_deg,
        )?;
        Ok(Self {
            radar,
            processing,
            device,
            iq_layout: IqLayout::default(),
            steering,
        })
    }

    pub fn with_iq_layout(mut self, iq_layout: IqLayout) -> Self {
        self.iq_layout = iq_layout;
        self
    }

    pub fn radar(&self) -> &RadarConfiguration {
        &self.radar
    }

    pub fn processing(&self) -> &ProcessingConfig {
        &self.processing
    }

    pub fn device(&self) -> DeviceModel {
        self.device
    }

    pub fn steering(&self) -> &SteeringVectorSet {
        &self.steering
    }

    /// Organize, correct RX phase, and separate by TX.
    pub fn prepare(&self, frame: &RawFrame) -> Result<VirtualAntennaCube> {
        let cube = organize_with_layout(
            frame,
            self.radar.chirps_per_frame(),
            self.radar.rx_antennas(),
            self.radar.adc_samples(),
            self.iq_layout,
        )?
        .correct_rx_phase(self.device.layout())?;
        let separated = separate_by_tx(&cube, self.radar.tx_antennas())?;
        log::debug!(
            "Prepared frame into {:?} virtual antenna cube",
            separated.shape()
        );
        Ok(separated)
    }

    pub fn heatmap(&self, frame: &RawFrame, kind: HeatmapKind) -> Result<SpectralMatrix> {
        let cube = self.prepare(frame)?;
        self.heatmap_from_cube(&cube, kind)
    }

    /// Magnitude heatmap of an already prepared cube.
    pub fn heatmap_from_cube(
        &self,
        cube: &VirtualAntennaCube,
        kind: HeatmapKind,
    ) -> Result<SpectralMatrix> {
        let (radar, processing, layout) = (&self.radar, &self.processing, self.device.layout());
        match kind {
            HeatmapKind::Range => Ok(range_heatmap(cube, radar, processing)?.magnitude()),
            HeatmapKind::DopplerRange => {
                Ok(doppler_range_heatmap(cube, radar, processing)?.magnitude())
            }
            HeatmapKind::DopplerRangePadded => doppler_fft(cube, radar, processing),
            HeatmapKind::AzimuthRange => azimuth_range_heatmap(cube, radar, processing, layout),
            HeatmapKind::ElevationRange => {
                elevation_range_heatmap(cube, radar, processing, layout)
            }
            HeatmapKind::AzimuthGrid => {
                grid_angle_heatmaps(cube, radar, processing, layout).map(|(azimuth, _)| azimuth)
            }
            HeatmapKind::ElevationGrid => {
                grid_angle_heatmaps(cube, radar, processing, layout).map(|(_, elevation)| elevation)
            }
            HeatmapKind::CaponRange => {
                capon_range_heatmap(cube, radar, processing, layout, &self.steering)
            }
            HeatmapKind::MusicRange => {
                music_range_heatmap(cube, radar, processing, layout, &self.steering)
            }
        }
    }

    pub fn range_profile(&self, frame: &RawFrame) -> Result<RangeProfile> {
        let cube = self.prepare(frame)?;
        Ok(self.range_profile_from_cube(&cube))
    }

    /// Range profile of an already prepared cube.
    pub fn range_profile_from_cube(&self, cube: &VirtualAntennaCube) -> RangeProfile {
        let spectrum = range_fft(cube.chirp(0), &self.radar, &self.processing);
        RangeProfile {
            magnitude: range_profile(&spectrum),
            bins: spectrum.bins,
        }
    }

    /// Median phase per virtual antenna at the strongest range bin, in degrees.
    pub fn frame_phases(
        &self,
        frame: &RawFrame,
        reference_antenna: usize,
        search_bins: usize,
    ) -> Result<Vec<f64>> {
        let cube = self.prepare(frame)?;
        frame_phases(
            &cube,
            &self.radar,
            &self.processing,
            reference_antenna,
            search_bins,
        )
    }

    pub fn sequence<'a>(
        &'a self,
        frames: &'a [RawFrame],
        kind: HeatmapKind,
    ) -> HeatmapSequence<'a> {
        HeatmapSequence {
            processor: self,
            frames,
            kind,
            position: 0,
        }
    }
}

/// Lazily processes a run of frames into heatmaps, one per `next()`.
pub struct HeatmapSequence<'a> {
    processor: &'a FrameProcessor,
    frames: &'a [RawFrame],
    kind: HeatmapKind,
    position: usize,
}

impl HeatmapSequence<'_> {
    /// Rewind to the first frame.
    pub fn restart(&mut self) {
        self.position = 0;
    }

    pub fn kind(&self) -> HeatmapKind {
        self.kind
    }
}

impl Iterator for HeatmapSequence<'_> {
    type Item = Result<SpectralMatrix>;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.frames.get(self.position)?;
        self.position += 1;
        Some(self.processor.heatmap(frame, self.kind))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.frames.len() - self.position;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for HeatmapSequence<'_> {}
