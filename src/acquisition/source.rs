use std::io::{ErrorKind, Read};

use chrono::Utc;

use crate::config::HardwareParameters;
use crate::error::Result;
use crate::organize::RawFrame;
use crate::session::SessionRecord;

/// Anything that yields raw frames: a capture card, a byte stream, a
/// recording.
pub trait FrameSource {
    /// Drop any partially buffered data so the next read starts on a fresh frame.
    fn clear_buffer(&mut self) -> Result<()>;

    /// Next complete frame, or `None` once the source is exhausted.
    fn read(&mut self) -> Result<Option<RawFrame>>;
}

/// Replays the frames of a recorded session.
pub struct RecordingSource {
    frames: Vec<RawFrame>,
    position: usize,
}

impl RecordingSource {
    pub fn new(frames: Vec<RawFrame>) -> Self {
        Self {
            frames,
            position: 0,
        }
    }

    pub fn from_session(session: SessionRecord) -> Self {
        Self::new(session.data)
    }

    pub fn restart(&mut self) {
        self.position = 0;
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameSource for RecordingSource {
    fn clear_buffer(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self) -> Result<Option<RawFrame>> {
        let frame = self.frames.get(self.position).cloned();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }
}

/// Little-endian 16-bit frames read back to back from a byte stream.
pub struct StreamSource<R> {
    reader: R,
    frame_bytes: usize,
}

impl<R: Read> StreamSource<R> {
    /// `frame_words` is the number of 16-bit words per frame.
    pub fn new(reader: R, frame_words: usize) -> Self {
        Self {
            reader,
            frame_bytes: frame_words * 2,
        }
    }
}

impl<R: Read> FrameSource for StreamSource<R> {
    fn clear_buffer(&mut self) -> Result<()> {
        Ok(())
    }

    fn read(&mut self) -> Result<Option<RawFrame>> {
        let mut bytes = vec![0u8; self.frame_bytes];
        match self.reader.read_exact(&mut bytes) {
            Ok(()) => RawFrame::from_le_bytes(&bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read up to `frames` frames, clearing the source buffer before each one,
/// and package them as a session.
pub fn record(
    source: &mut dyn FrameSource,
    frames: usize,
    description: &str,
    config: HardwareParameters,
) -> Result<SessionRecord> {
    let mut data = Vec::with_capacity(frames);
    let mut timestamps = Vec::with_capacity(frames);
    for _ in 0..frames {
        source.clear_buffer()?;
        match source.read()? {
            Some(frame) => {
                timestamps.push(Utc::now());
                data.push(frame);
            }
            None => {
                log::warn!(
                    "Frame source ended after {} of {frames} frames",
                    data.len()
                );
                break;
            }
        }
    }
    log::info!("Recorded {} frames for '{description}'", data.len());
    Ok(SessionRecord::new(description, config, data, timestamps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_recording_source_replays_and_restarts() {
        let mut source = RecordingSource::new(vec![
            RawFrame::new(vec![1, 2]),
            RawFrame::new(vec![3, 4]),
        ]);
        assert_eq!(source.read().unwrap(), Some(RawFrame::new(vec![1, 2])));
        assert_eq!(source.read().unwrap(), Some(RawFrame::new(vec![3, 4])));
        assert_eq!(source.read().unwrap(), None);
        source.restart();
        assert_eq!(source.read().unwrap(), Some(RawFrame::new(vec![1, 2])));
    }

    #[test]
    fn test_stream_source_splits_frames() {
        let bytes: Vec<u8> = vec![1, 0, 2, 0, 3, 0, 4, 0, 5, 0];
        let mut source = StreamSource::new(Cursor::new(bytes), 2);
        assert_eq!(source.read().unwrap(), Some(RawFrame::new(vec![1, 2])));
        assert_eq!(source.read().unwrap(), Some(RawFrame::new(vec![3, 4])));
        // Trailing partial frame is dropped
        assert_eq!(source.read().unwrap(), None);
    }

    #[test]
    fn test_record_stops_at_end_of_source() {
        let mut source = RecordingSource::new(vec![RawFrame::new(vec![0; 4]); 3]);
        let session = record(
            &mut source,
            5,
            "person walking",
            HardwareParameters::iwr1843_default(),
        )
        .unwrap();
        assert_eq!(session.frames, 3);
        assert_eq!(session.timestamps.len(), 3);
        assert_eq!(session.id, "PW");
    }
}
