//! Recorded sessions.
//!
//! A session is a JSON document holding the hardware parameters the frames
//! were captured with, so a recording can be replayed without the device.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{HardwareParameters, RadarConfiguration};
use crate::error::{RadarError, Result};
use crate::organize::RawFrame;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub description: String,
    /// Upper-case initials of the description
    pub id: String,
    pub date: DateTime<Utc>,
    pub config: HardwareParameters,
    /// Number of recorded frames
    pub frames: usize,
    pub data: Vec<RawFrame>,
    /// Capture time of each frame; empty for synthetic sessions
    #[serde(default)]
    pub timestamps: Vec<DateTime<Utc>>,
}

/// Upper-case first letter of every whitespace-separated word.
pub fn short_id(description: &str) -> String {
    description
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

impl SessionRecord {
    pub fn new(
        description: impl Into<String>,
        config: HardwareParameters,
        data: Vec<RawFrame>,
        timestamps: Vec<DateTime<Utc>>,
    ) -> Self {
        let description = description.into();
        Self {
            id: short_id(&description),
            description,
            date: Utc::now(),
            config,
            frames: data.len(),
            data,
            timestamps,
        }
    }

    /// `openradar_<dd-mm-yy>_<id>.json`
    pub fn file_name(&self) -> String {
        format!("openradar_{}_{}.json", self.date.format("%d-%m-%y"), self.id)
    }

    /// Write the session into `dir` under [`Self::file_name`].
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        self.save(&path)?;
        Ok(path)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let record: Self = serde_json::from_reader(reader)?;
        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<()> {
        if self.frames != self.data.len() {
            return Err(RadarError::shape(
                "session frames",
                format!("{} frames", self.frames),
                format!("{} frames of data", self.data.len()),
            ));
        }
        if !self.timestamps.is_empty() && self.timestamps.len() != self.data.len() {
            return Err(RadarError::shape(
                "session timestamps",
                format!("{} timestamps", self.data.len()),
                self.timestamps.len(),
            ));
        }
        Ok(())
    }

    /// Radar configuration the session was recorded with.
    pub fn radar_configuration(&self) -> Result<RadarConfiguration> {
        RadarConfiguration::from_parameters(&self.config)
    }
}
