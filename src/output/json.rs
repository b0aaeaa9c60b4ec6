use super::{Formatter, HeatmapOutput, iso8601_timestamp};

/// One JSON object per frame.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, output: &HeatmapOutput<'_>) -> String {
        serde_json::json!({
            "ts": iso8601_timestamp(),
            "frame": output.frame,
            "kind": output.kind,
            "heatmap": output.matrix,
        })
        .to_string()
    }
}
