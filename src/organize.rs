//! Raw frame reorganisation.
//!
//! A raw frame is a flat run of 16-bit ADC words. Organising it yields a
//! complex cube indexed by `(chirp, rx, sample)`; separating that cube by
//! transmit antenna yields `(loop, virtual antenna, sample)`, with virtual
//! antenna `tx * num_rx + rx`.

use ndarray::{Array2, Array3, ArrayView2, Axis, s};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::device::AntennaLayout;
use crate::error::{RadarError, Result};

/// One captured frame of raw ADC words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawFrame(Vec<i16>);

impl RawFrame {
    pub fn new(words: Vec<i16>) -> Self {
        Self(words)
    }

    /// Reinterpret little-endian capture bytes as 16-bit words.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(RadarError::shape(
                "raw frame bytes",
                "an even byte count",
                bytes.len(),
            ));
        }
        Ok(Self(
            bytes
                .chunks_exact(2)
                .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                .collect(),
        ))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn words(&self) -> &[i16] {
        &self.0
    }
}

/// Ordering of I and Q words in a raw frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum IqLayout {
    /// `I0 Q0 I1 Q1 ...`
    #[default]
    Interleaved,
    /// `I0 I1 Q0 Q1 ...`, as streamed by the DCA1000 LVDS capture
    Dca1000Lvds,
}

impl IqLayout {
    fn combine(&self, words: &[i16]) -> Result<Vec<Complex64>> {
        let c = |re: i16, im: i16| Complex64::new(re as f64, im as f64);
        match self {
            Self::Interleaved => Ok(words.chunks_exact(2).map(|p| c(p[0], p[1])).collect()),
            Self::Dca1000Lvds => {
                if words.len() % 4 != 0 {
                    return Err(RadarError::shape(
                        "DCA1000 LVDS frame",
                        "a multiple of 4 words",
                        words.len(),
                    ));
                }
                Ok(words
                    .chunks_exact(4)
                    .flat_map(|g| [c(g[0], g[2]), c(g[1], g[3])])
                    .collect())
            }
        }
    }
}

/// Complex samples indexed by `(chirp, rx, sample)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizedCube {
    data: Array3<Complex64>,
    rx_phase_corrected: bool,
}

impl OrganizedCube {
    pub fn from_array(data: Array3<Complex64>) -> Self {
        Self {
            data,
            rx_phase_corrected: false,
        }
    }

    pub fn data(&self) -> &Array3<Complex64> {
        &self.data
    }

    pub fn into_data(self) -> Array3<Complex64> {
        self.data
    }

    /// `(chirps, rx, samples)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn rx_phase_corrected(&self) -> bool {
        self.rx_phase_corrected
    }

    /// Negate the RX channels the layout marks as inverted.
    ///
    /// The correction is recorded on the cube; a second call leaves the data
    /// untouched.
    pub fn correct_rx_phase(mut self, layout: &AntennaLayout) -> Result<Self> {
        if self.rx_phase_corrected {
            log::debug!("RX phase correction already applied, skipping");
            return Ok(self);
        }
        let num_rx = self.data.dim().1;
        for &rx in layout.inverted_rx {
            if rx >= num_rx {
                return Err(RadarError::shape(
                    "RX inversion mask",
                    format!("RX index below {num_rx}"),
                    rx,
                ));
            }
            self.data
                .slice_mut(s![.., rx, ..])
                .mapv_inplace(|z| -z);
        }
        self.rx_phase_corrected = true;
        Ok(self)
    }
}

/// Complex samples indexed by `(loop, virtual antenna, sample)`.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualAntennaCube(Array3<Complex64>);

impl VirtualAntennaCube {
    pub fn from_array(data: Array3<Complex64>) -> Self {
        Self(data)
    }

    pub fn data(&self) -> &Array3<Complex64> {
        &self.0
    }

    pub fn into_data(self) -> Array3<Complex64> {
        self.0
    }

    /// `(loops, virtual antennas, samples)`
    pub fn shape(&self) -> (usize, usize, usize) {
        self.0.dim()
    }

    pub fn loops(&self) -> usize {
        self.0.dim().0
    }

    pub fn antennas(&self) -> usize {
        self.0.dim().1
    }

    pub fn samples(&self) -> usize {
        self.0.dim().2
    }

    /// `(virtual antenna, sample)` slice of one chirp loop.
    pub fn chirp(&self, index: usize) -> ArrayView2<'_, Complex64> {
        self.0.index_axis(Axis(0), index)
    }

    /// `(loop, sample)` slice of one virtual antenna.
    pub fn antenna(&self, index: usize) -> ArrayView2<'_, Complex64> {
        self.0.index_axis(Axis(1), index)
    }

    /// Coherent mean over chirp loops, `(virtual antenna, sample)`.
    pub fn mean_over_loops(&self) -> Array2<Complex64> {
        let loops = self.loops().max(1) as f64;
        self.0.sum_axis(Axis(0)).mapv(|z| z / loops)
    }

    /// Coherent mean over virtual antennas, `(loop, sample)`.
    pub fn mean_over_antennas(&self) -> Array2<Complex64> {
        let antennas = self.antennas().max(1) as f64;
        self.0.sum_axis(Axis(1)).mapv(|z| z / antennas)
    }
}

/// Reshape a raw frame of interleaved I/Q words into `(chirp, rx, sample)`.
pub fn organize(
    frame: &RawFrame,
    chirps_per_frame: usize,
    num_rx: usize,
    samples_per_chirp: usize,
) -> Result<OrganizedCube> {
    organize_with_layout(
        frame,
        chirps_per_frame,
        num_rx,
        samples_per_chirp,
        IqLayout::Interleaved,
    )
}

pub fn organize_with_layout(
    frame: &RawFrame,
    chirps_per_frame: usize,
    num_rx: usize,
    samples_per_chirp: usize,
    iq_layout: IqLayout,
) -> Result<OrganizedCube> {
    let expected = chirps_per_frame * num_rx * samples_per_chirp * 2;
    if frame.len() != expected {
        return Err(RadarError::shape(
            "raw frame length",
            format!("{chirps_per_frame} chirps x {num_rx} rx x {samples_per_chirp} samples x 2 = {expected} words"),
            format!("{} words", frame.len()),
        ));
    }

    let samples = iq_layout.combine(frame.words())?;
    let data = Array3::from_shape_vec((chirps_per_frame, num_rx, samples_per_chirp), samples)
        .map_err(|e| RadarError::shape("organized cube", expected / 2, e))?;
    Ok(OrganizedCube::from_array(data))
}

/// De-interleave chirps by transmit antenna.
///
/// Chirp `c` was transmitted by TX `c % num_tx`; loop `c / num_tx` of the
/// output holds every TX/RX pair as virtual antenna `tx * num_rx + rx`.
pub fn separate_by_tx(cube: &OrganizedCube, num_tx: usize) -> Result<VirtualAntennaCube> {
    let (chirps, num_rx, samples) = cube.shape();
    if num_tx == 0 || chirps % num_tx != 0 {
        return Err(RadarError::shape(
            "TX separation",
            format!("chirp count divisible by {num_tx} TX antennas"),
            format!("{chirps} chirps"),
        ));
    }

    let data = cube.data();
    let separated = Array3::from_shape_fn((chirps / num_tx, num_tx * num_rx, samples), |(l, v, n)| {
        data[[l * num_tx + v / num_rx, v % num_rx, n]]
    });
    Ok(VirtualAntennaCube(separated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceModel;

    fn ramp_frame(len: usize) -> RawFrame {
        RawFrame::new((0..len).map(|i| i as i16).collect())
    }

    #[test]
    fn test_organize_shape_and_pairing() {
        let frame = ramp_frame(6 * 4 * 8 * 2);
        let cube = organize(&frame, 6, 4, 8).unwrap();
        assert_eq!(cube.shape(), (6, 4, 8));

        let data = cube.data();
        assert_eq!(data[[0, 0, 0]], Complex64::new(0.0, 1.0));
        assert_eq!(data[[0, 0, 1]], Complex64::new(2.0, 3.0));
        // chirp 1, rx 2, sample 3 -> complex index ((1 * 4) + 2) * 8 + 3 = 51
        assert_eq!(data[[1, 2, 3]], Complex64::new(102.0, 103.0));
    }

    #[test]
    fn test_organize_rejects_wrong_length() {
        let frame = ramp_frame(100);
        let err = organize(&frame, 6, 4, 8).unwrap_err();
        match err {
            RadarError::Shape { expected, actual, .. } => {
                assert!(expected.contains("384"));
                assert!(actual.contains("100"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_dca1000_layout() {
        let frame = RawFrame::new(vec![1, 2, 10, 20, 3, 4, 30, 40]);
        let cube = organize_with_layout(&frame, 1, 1, 4, IqLayout::Dca1000Lvds).unwrap();
        let data = cube.data();
        assert_eq!(data[[0, 0, 0]], Complex64::new(1.0, 10.0));
        assert_eq!(data[[0, 0, 1]], Complex64::new(2.0, 20.0));
        assert_eq!(data[[0, 0, 3]], Complex64::new(4.0, 40.0));
    }

    #[test]
    fn test_from_le_bytes() {
        let frame = RawFrame::from_le_bytes(&[0x01, 0x00, 0xff, 0xff]).unwrap();
        assert_eq!(frame.words(), &[1, -1]);
        assert!(RawFrame::from_le_bytes(&[0x01]).is_err());
    }

    #[test]
    fn test_separate_by_tx() {
        let (tx, rx, loops, samples) = (3, 4, 5, 8);
        let frame = ramp_frame(tx * rx * loops * samples * 2);
        let cube = organize(&frame, tx * loops, rx, samples).unwrap();
        let virt = separate_by_tx(&cube, tx).unwrap();
        assert_eq!(virt.shape(), (loops, tx * rx, samples));

        // loop 2, tx 1, rx 3 came from chirp 2 * 3 + 1 = 7
        let data = cube.data();
        for n in 0..samples {
            assert_eq!(virt.data()[[2, rx + 3, n]], data[[7, 3, n]]);
        }
    }

    #[test]
    fn test_separate_rejects_indivisible_chirps() {
        let cube = organize(&ramp_frame(7 * 2 * 4 * 2), 7, 2, 4).unwrap();
        assert!(matches!(
            separate_by_tx(&cube, 3),
            Err(RadarError::Shape { .. })
        ));
    }

    #[test]
    fn test_rx_inversion_applied_once() {
        let frame = RawFrame::new(vec![1; 2 * 4 * 2 * 2]);
        let layout = DeviceModel::Iwr6843IskOds.layout();
        let cube = organize(&frame, 2, 4, 2)
            .unwrap()
            .correct_rx_phase(layout)
            .unwrap();
        assert!(cube.rx_phase_corrected());

        let twice = cube.clone().correct_rx_phase(layout).unwrap();
        assert_eq!(twice, cube);

        let one = Complex64::new(1.0, 1.0);
        let data = cube.data();
        assert_eq!(data[[0, 0, 0]], one);
        assert_eq!(data[[0, 1, 0]], -one);
        assert_eq!(data[[1, 2, 1]], -one);
        assert_eq!(data[[1, 3, 1]], one);
    }
}
