/// Indices of every bin whose magnitude strictly exceeds `threshold`.
///
/// Plain threshold crossing: adjacent bins are not merged and no minimum
/// spacing is enforced. Indices come back in ascending order.
pub fn find_peaks(magnitudes: &[f64], threshold: f64) -> Vec<usize> {
    magnitudes
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > threshold)
        .map(|(i, _)| i)
        .collect()
}
