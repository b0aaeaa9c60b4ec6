use super::{Formatter, HeatmapOutput};
use crate::spectral::BinAxis;

pub struct TextFormatter {
    verbose: bool,
}

impl TextFormatter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

fn describe_axis(axis: &BinAxis) -> String {
    match (axis.values.first(), axis.values.last()) {
        (Some(first), Some(last)) => format!(
            "{:?} {} bins [{:.2} .. {:.2}] {}",
            axis.quantity,
            axis.len(),
            first,
            last,
            axis.quantity.unit()
        ),
        _ => format!("{:?} (empty)", axis.quantity),
    }
}

impl Formatter for TextFormatter {
    fn format(&self, output: &HeatmapOutput<'_>) -> String {
        let matrix = output.matrix;
        let peak = match matrix.peak() {
            Some((r, c, value)) => format!(
                "peak {} at {:.2} {}, {:.2} {}",
                value,
                matrix.rows().values[r],
                matrix.rows().quantity.unit(),
                matrix.cols().values[c],
                matrix.cols().quantity.unit()
            ),
            None => "no finite values".to_string(),
        };
        if self.verbose {
            format!(
                "Frame {:>4} {}: {} | rows: {} | cols: {}",
                output.frame,
                output.kind,
                peak,
                describe_axis(matrix.rows()),
                describe_axis(matrix.cols())
            )
        } else {
            format!("Frame {:>4} {}: {}", output.frame, output.kind, peak)
        }
    }
}
