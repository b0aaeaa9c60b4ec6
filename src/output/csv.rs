use std::fmt::Write;

use super::{Formatter, HeatmapOutput, iso8601_timestamp};

/// One line per matrix cell.
pub struct CsvFormatter;

impl Formatter for CsvFormatter {
    fn format(&self, output: &HeatmapOutput<'_>) -> String {
        let ts = iso8601_timestamp();
        let matrix = output.matrix;
        let mut text = String::new();
        for ((r, c), value) in matrix.values().indexed_iter() {
            if !text.is_empty() {
                text.push('\n');
            }
            let _ = write!(
                text,
                "{},{},{},{},{},{}",
                ts,
                output.frame,
                output.kind,
                matrix.rows().values[r],
                matrix.cols().values[c],
                value
            );
        }
        text
    }

    fn header(&self) -> Option<&'static str> {
        Some("ts,frame,kind,row,col,value")
    }
}
