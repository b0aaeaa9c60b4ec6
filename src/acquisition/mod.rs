pub mod source;

pub use source::{FrameSource, RecordingSource, StreamSource, record};
