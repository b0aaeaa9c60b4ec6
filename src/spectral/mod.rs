pub mod angle;
pub mod doppler;
pub mod matrix;
pub mod peaks;
pub mod phase;
pub mod range;

pub use angle::{AngleSpectrum, angle_fft, arcsine_bins, line_angle_fft};
pub use doppler::doppler_fft;
pub use matrix::{BinAxis, Quantity, SpectralMatrix};
pub use peaks::find_peaks;
pub use phase::{chirp_phases, frame_phases, phase_difference, phase_differences};
pub use range::{RadarCube, RangeSpectrum, radar_cube, range_fft, range_profile};

use ndarray::{Array2, ArrayView2, Axis, s};
use num_complex::Complex64;
use rustfft::FftPlanner;
use rustfft::num_traits::Zero;

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Forward FFT of every lane along `axis`, zero-padded to `len`.
///
/// `len` must be at least the input length along `axis`.
pub(crate) fn fft_along(
    input: ArrayView2<'_, Complex64>,
    axis: Axis,
    len: usize,
    planner: &mut FftPlanner<f64>,
) -> Array2<Complex64> {
    debug_assert!(len >= input.len_of(axis));
    let mut shape = [input.nrows(), input.ncols()];
    shape[axis.index()] = len;

    let mut output = Array2::<Complex64>::zeros((shape[0], shape[1]));
    let fft = planner.plan_fft_forward(len);
    let mut buffer = vec![Complex64::new(0.0, 0.0); len];

    for (lane_in, mut lane_out) in input.lanes(axis).into_iter().zip(output.lanes_mut(axis)) {
        buffer.fill(Complex64::new(0.0, 0.0));
        for (dst, src) in buffer.iter_mut().zip(lane_in.iter()) {
            *dst = *src;
        }
        fft.process(&mut buffer);
        for (dst, src) in lane_out.iter_mut().zip(buffer.iter()) {
            *dst = *src;
        }
    }
    output
}

/// Zero-padded 2-D FFT to `(rows, cols)`.
pub(crate) fn fft2(
    input: ArrayView2<'_, Complex64>,
    rows: usize,
    cols: usize,
    planner: &mut FftPlanner<f64>,
) -> Array2<Complex64> {
    let along_cols = fft_along(input, Axis(1), cols, planner);
    fft_along(along_cols.view(), Axis(0), rows, planner)
}

/// Move the zero-frequency bin to the centre of `axis`.
pub(crate) fn fftshift<T: Clone>(data: &mut Array2<T>, axis: Axis) {
    let n = data.len_of(axis);
    if n < 2 {
        return;
    }
    let mut scratch = Vec::with_capacity(n);
    for mut lane in data.lanes_mut(axis) {
        scratch.clear();
        scratch.extend(lane.iter().cloned());
        scratch.rotate_right(n / 2);
        for (dst, src) in lane.iter_mut().zip(scratch.drain(..)) {
            *dst = src;
        }
    }
}

/// Zero the first `bins` columns of a `(row, range bin)` matrix.
pub(crate) fn zero_near_field<T: Clone + Zero>(data: &mut Array2<T>, bins: usize) {
    let bins = bins.min(data.ncols());
    data.slice_mut(s![.., ..bins]).fill(T::zero());
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(3.0, 7.0, 1), vec![3.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_fftshift_even_and_odd() {
        let mut even = array![[0.0, 1.0, 2.0, 3.0]];
        fftshift(&mut even, Axis(1));
        assert_eq!(even, array![[2.0, 3.0, 0.0, 1.0]]);

        let mut odd = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        fftshift(&mut odd, Axis(0));
        assert_eq!(odd, array![[3.0], [4.0], [0.0], [1.0], [2.0]]);
    }

    #[test]
    fn test_fft_along_zero_pads() {
        let one = Complex64::new(1.0, 0.0);
        let input = array![[one, one]];
        let mut planner = FftPlanner::new();
        let out = fft_along(input.view(), Axis(1), 4, &mut planner);
        assert_eq!(out.dim(), (1, 4));
        // [1, 1, 0, 0] -> [2, 1-j, 0, 1+j]
        assert_abs_diff_eq!(out[[0, 0]].re, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 1]].im, -1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(out[[0, 2]].norm(), 0.0, epsilon = 1e-12);
    }
}
