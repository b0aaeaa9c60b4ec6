//! Radar configuration.
//!
//! Hardware parameters arrive as a flat named-value mapping, either parsed
//! from the capture script (`KEY = VALUE - comment` lines) or restored from a
//! recorded session. [`RadarConfiguration::from_parameters`] validates them
//! once and exposes every physics-derived quantity as a pure function of the
//! resolved values.
//!
//! ```
//! use mmwave_radar::config::{HardwareParameters, RadarConfiguration};
//!
//! let params = HardwareParameters::iwr1843_default();
//! let config = RadarConfiguration::from_parameters(&params).unwrap();
//! assert_eq!(config.tx_antennas(), 3);
//! assert!(config.range_resolution() > 0.0);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    ANGLE_RANGE_DEG, ANGLE_RESOLUTION_DEG, AZIMUTH_BINS, DOPPLER_PADDING, ELEVATION_BINS,
    NEAR_FIELD_BINS, SPEED_OF_LIGHT, UNAMBIGUOUS_RANGE_FRACTION,
};
use crate::error::{RadarError, Result};

/// Number of lines of the capture script that carry parameters.
pub const CONFIG_FILE_LINES: usize = 39;

/// Keys ignored when read from a file; they are recomputed from the TX enable flags.
const DERIVED_KEYS: [&str; 2] = ["NUM_TX", "END_CHIRP_TX"];

const TX_ENABLE_KEYS: [&str; 3] = ["TX0_EN", "TX1_EN", "TX2_EN"];

/// Named hardware parameters in capture-script units
/// (GHz, µs, MHz/µs, ksps, dB, ms).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareParameters(BTreeMap<String, f64>);

impl HardwareParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn require(&self, key: &str) -> Result<f64> {
        let value = self
            .get(key)
            .ok_or_else(|| RadarError::Config(format!("missing parameter {key}")))?;
        if !value.is_finite() {
            return Err(RadarError::Config(format!("parameter {key} is not finite")));
        }
        Ok(value)
    }

    fn require_count(&self, key: &str) -> Result<usize> {
        let value = self.require(key)?;
        if value < 0.0 || value.fract() != 0.0 {
            return Err(RadarError::Config(format!(
                "parameter {key} must be a non-negative integer, got {value}"
            )));
        }
        Ok(value as usize)
    }

    /// Recompute `NUM_TX` and `END_CHIRP_TX` from the TX enable flags.
    ///
    /// Missing flags are left alone; [`RadarConfiguration::from_parameters`]
    /// reports them.
    pub fn derive_tx_count(&mut self) {
        let flags: Option<Vec<f64>> = TX_ENABLE_KEYS.iter().map(|k| self.get(k)).collect();
        if let Some(flags) = flags {
            let num_tx: f64 = flags.iter().sum();
            self.insert("NUM_TX", num_tx);
            self.insert("END_CHIRP_TX", num_tx - 1.0);
        }
    }

    /// Parameters of the stock IWR1843 capture script (3 TX, 4 RX, 128 loops).
    pub fn iwr1843_default() -> Self {
        let mut params: Self = [
            ("NUM_RX", 4.0),
            ("START_FREQ", 77.0),
            ("IDLE_TIME", 100.0),
            ("RAMP_END_TIME", 60.0),
            ("ADC_START_TIME", 6.0),
            ("FREQ_SLOPE", 29.982),
            ("ADC_SAMPLES", 128.0),
            ("SAMPLE_RATE", 2500.0),
            ("RX_GAIN", 30.0),
            ("CHIRP_LOOPS", 128.0),
            ("PERIODICITY", 100.0),
            ("TX0_EN", 1.0),
            ("TX1_EN", 1.0),
            ("TX2_EN", 1.0),
        ]
        .into_iter()
        .collect();
        params.derive_tx_count();
        params
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for HardwareParameters {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Parse the parameter block of a capture script.
///
/// Only the first `max_lines` lines are considered. Lines starting with `-`
/// (Lua comments) and blank lines are skipped; everything after ` -` on a
/// value is a trailing comment.
pub fn parse_hardware_config(text: &str, max_lines: usize) -> Result<HardwareParameters> {
    let mut params = HardwareParameters::new();

    for (line_no, line) in text.lines().take(max_lines).enumerate() {
        if line.starts_with('-') || line.trim().is_empty() {
            continue;
        }

        let Some((key, rest)) = line.split_once(" = ") else {
            log::warn!("Skipping unrecognised config line {}: {:?}", line_no + 1, line);
            continue;
        };
        let key = key.trim();
        if DERIVED_KEYS.contains(&key) {
            continue;
        }

        let raw_value = rest.split(" -").next().unwrap_or(rest).trim();
        let value: f64 = raw_value.parse().map_err(|_| {
            RadarError::Config(format!(
                "line {}: invalid value {:?} for {}",
                line_no + 1,
                raw_value,
                key
            ))
        })?;
        params.insert(key, value);
    }

    params.derive_tx_count();
    Ok(params)
}

/// Read and parse a capture script from disk.
pub fn load_hardware_config<P: AsRef<Path>>(path: P) -> Result<HardwareParameters> {
    let text = std::fs::read_to_string(path.as_ref())?;
    parse_hardware_config(&text, CONFIG_FILE_LINES)
}

/// Immutable radar configuration resolved to SI units.
///
/// Construct with [`RadarConfiguration::from_parameters`]; switching between
/// live defaults and a recording's configuration means building a new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarConfiguration {
    start_frequency_hz: f64,
    idle_time_s: f64,
    ramp_end_time_s: f64,
    adc_start_time_s: f64,
    frequency_slope_hz_per_s: f64,
    adc_samples: usize,
    sample_rate_hz: f64,
    rx_gain_db: f64,
    chirp_loops: usize,
    periodicity_ms: f64,
    tx_antennas: usize,
    rx_antennas: usize,
}

impl RadarConfiguration {
    pub fn from_parameters(params: &HardwareParameters) -> Result<Self> {
        let tx_antennas = TX_ENABLE_KEYS
            .iter()
            .map(|key| {
                let flag = params.require_count(key)?;
                if flag > 1 {
                    return Err(RadarError::Config(format!(
                        "{key} must be 0 or 1, got {flag}"
                    )));
                }
                Ok(flag)
            })
            .sum::<Result<usize>>()?;

        let config = Self {
            start_frequency_hz: params.require("START_FREQ")? * 1e9,
            idle_time_s: params.require("IDLE_TIME")? * 1e-6,
            ramp_end_time_s: params.require("RAMP_END_TIME")? * 1e-6,
            adc_start_time_s: params.require("ADC_START_TIME")? * 1e-6,
            frequency_slope_hz_per_s: params.require("FREQ_SLOPE")? * 1e6 / 1e-6,
            adc_samples: params.require_count("ADC_SAMPLES")?,
            sample_rate_hz: params.require("SAMPLE_RATE")? * 1e3,
            rx_gain_db: params.require("RX_GAIN")?,
            chirp_loops: params.require_count("CHIRP_LOOPS")?,
            periodicity_ms: params.require("PERIODICITY")?,
            tx_antennas,
            rx_antennas: params.require_count("NUM_RX")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("START_FREQ", self.start_frequency_hz),
            ("FREQ_SLOPE", self.frequency_slope_hz_per_s),
            ("RAMP_END_TIME", self.ramp_end_time_s),
            ("SAMPLE_RATE", self.sample_rate_hz),
        ];
        for (name, value) in positive {
            if value <= 0.0 {
                return Err(RadarError::Config(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.idle_time_s < 0.0 {
            return Err(RadarError::Config("IDLE_TIME must not be negative".into()));
        }

        let counts = [
            ("ADC_SAMPLES", self.adc_samples),
            ("CHIRP_LOOPS", self.chirp_loops),
            ("NUM_RX", self.rx_antennas),
            ("NUM_TX", self.tx_antennas),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(RadarError::Config(format!("{name} must be at least 1")));
            }
        }

        if self.bandwidth_hz() <= 0.0 {
            return Err(RadarError::Config(format!(
                "bandwidth must be positive, got {} Hz",
                self.bandwidth_hz()
            )));
        }
        Ok(())
    }

    pub fn start_frequency_hz(&self) -> f64 {
        self.start_frequency_hz
    }

    pub fn idle_time_s(&self) -> f64 {
        self.idle_time_s
    }

    pub fn ramp_end_time_s(&self) -> f64 {
        self.ramp_end_time_s
    }

    pub fn adc_start_time_s(&self) -> f64 {
        self.adc_start_time_s
    }

    pub fn frequency_slope_hz_per_s(&self) -> f64 {
        self.frequency_slope_hz_per_s
    }

    pub fn adc_samples(&self) -> usize {
        self.adc_samples
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.sample_rate_hz
    }

    pub fn rx_gain_db(&self) -> f64 {
        self.rx_gain_db
    }

    pub fn chirp_loops(&self) -> usize {
        self.chirp_loops
    }

    pub fn periodicity_ms(&self) -> f64 {
        self.periodicity_ms
    }

    pub fn tx_antennas(&self) -> usize {
        self.tx_antennas
    }

    pub fn rx_antennas(&self) -> usize {
        self.rx_antennas
    }

    pub fn virtual_antennas(&self) -> usize {
        self.tx_antennas * self.rx_antennas
    }

    /// Chirps transmitted per frame (all TX antennas, all loops).
    pub fn chirps_per_frame(&self) -> usize {
        self.chirp_loops * self.tx_antennas
    }

    /// Number of i16 words in one raw frame.
    pub fn raw_frame_len(&self) -> usize {
        self.chirps_per_frame() * self.rx_antennas * self.adc_samples * 2
    }

    pub fn wavelength_m(&self) -> f64 {
        SPEED_OF_LIGHT / self.start_frequency_hz
    }

    pub fn chirp_duration_s(&self) -> f64 {
        self.idle_time_s + self.ramp_end_time_s
    }

    /// Time between two chirps from the same TX antenna.
    pub fn chirp_separation_s(&self) -> f64 {
        self.chirp_duration_s() * self.tx_antennas as f64
    }

    pub fn min_periodicity_ms(&self) -> f64 {
        self.chirp_duration_s() * self.chirp_loops as f64 * self.tx_antennas as f64 * 1000.0
    }

    pub fn sampling_time_s(&self) -> f64 {
        self.adc_samples as f64 / self.sample_rate_hz
    }

    pub fn bandwidth_hz(&self) -> f64 {
        self.frequency_slope_hz_per_s * self.ramp_end_time_s
    }

    pub fn range_bins(&self) -> usize {
        self.adc_samples
    }

    /// Range bin size in metres.
    pub fn range_resolution(&self) -> f64 {
        SPEED_OF_LIGHT / (2.0 * self.bandwidth_hz())
    }

    pub fn max_range(&self) -> f64 {
        self.range_resolution() * self.range_bins() as f64
    }

    pub fn max_unambiguous_range(&self) -> f64 {
        UNAMBIGUOUS_RANGE_FRACTION * self.max_range()
    }

    pub fn doppler_bins(&self) -> usize {
        self.chirp_loops
    }

    /// Doppler bin size in m/s.
    pub fn doppler_resolution(&self) -> f64 {
        self.wavelength_m() / (2.0 * self.chirp_loops as f64 * self.chirp_separation_s())
    }

    pub fn max_doppler(&self) -> f64 {
        self.wavelength_m() / (4.0 * self.chirp_separation_s())
    }
}

impl fmt::Display for RadarConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Slope: {:.4e} Hz/s", self.frequency_slope_hz_per_s)?;
        writeln!(f, "Bandwidth: {:.3} MHz", self.bandwidth_hz() / 1e6)?;
        writeln!(f, "TX/RX antennas: {}/{}", self.tx_antennas, self.rx_antennas)?;
        writeln!(
            f,
            "Minimum frame periodicity: {:.3} ms",
            self.min_periodicity_ms()
        )?;
        writeln!(f, "Chirps per frame: {}", self.chirps_per_frame())?;
        writeln!(f, "Range bins: {}", self.range_bins())?;
        writeln!(f, "Range resolution: {:.4} m", self.range_resolution())?;
        writeln!(
            f,
            "Max unambiguous range: {:.3} m",
            self.max_unambiguous_range()
        )?;
        writeln!(f, "Doppler bins: {}", self.doppler_bins())?;
        writeln!(f, "Doppler resolution: {:.4} m/s", self.doppler_resolution())?;
        write!(f, "Max Doppler: {:.3} m/s", self.max_doppler())
    }
}

/// Tunable processing constants.
///
/// Defaults reproduce the reference processing chain; a TOML file with any
/// subset of the fields overrides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Leading range bins forced to zero after the range FFT
    pub near_field_bins: usize,
    /// Zero-padding factor for both axes of the range-Doppler FFT
    pub doppler_padding: usize,
    /// Azimuth FFT size
    pub azimuth_bins: usize,
    /// Elevation FFT size
    pub elevation_bins: usize,
    /// Capon/MUSIC scan half-width in degrees
    pub angle_range_deg: f64,
    /// Capon/MUSIC scan step in degrees
    pub angle_resolution_deg: f64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            near_field_bins: NEAR_FIELD_BINS,
            doppler_padding: DOPPLER_PADDING,
            azimuth_bins: AZIMUTH_BINS,
            elevation_bins: ELEVATION_BINS,
            angle_range_deg: ANGLE_RANGE_DEG,
            angle_resolution_deg: ANGLE_RESOLUTION_DEG,
        }
    }
}

impl ProcessingConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| RadarError::Config(format!("{e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.doppler_padding == 0 {
            return Err(RadarError::Config("doppler_padding must be at least 1".into()));
        }
        if self.azimuth_bins == 0 || self.elevation_bins == 0 {
            return Err(RadarError::Config("angle bin counts must be at least 1".into()));
        }
        if !(self.angle_range_deg > 0.0 && self.angle_range_deg <= 90.0) {
            return Err(RadarError::Config(format!(
                "angle_range_deg must be in (0, 90], got {}",
                self.angle_range_deg
            )));
        }
        if self.angle_resolution_deg <= 0.0 {
            return Err(RadarError::Config("angle_resolution_deg must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCRIPT: &str = "\
-- Radar parameters
NUM_TX = 3
NUM_RX = 4 - receivers

START_FREQ = 77 - GHz
IDLE_TIME = 100 - us
RAMP_END_TIME = 60 - us
ADC_START_TIME = 6 - us
FREQ_SLOPE = 29.982 - MHz/us
ADC_SAMPLES = 128
SAMPLE_RATE = 2500 - ksps
RX_GAIN = 30 - dB
CHIRP_LOOPS = 128
PERIODICITY = 100 - ms
TX0_EN = 1
TX1_EN = 0
TX2_EN = 1
END_CHIRP_TX = 2
";

    #[test]
    fn test_parse_derives_tx_count() {
        let params = parse_hardware_config(SCRIPT, CONFIG_FILE_LINES).unwrap();
        assert_eq!(params.get("NUM_TX"), Some(2.0));
        assert_eq!(params.get("END_CHIRP_TX"), Some(1.0));
        assert_eq!(params.get("START_FREQ"), Some(77.0));
        assert_eq!(params.get("FREQ_SLOPE"), Some(29.982));
    }

    #[test]
    fn test_parse_respects_line_limit() {
        let params = parse_hardware_config(SCRIPT, 3).unwrap();
        assert_eq!(params.get("NUM_RX"), Some(4.0));
        assert_eq!(params.get("START_FREQ"), None);
    }

    #[test]
    fn test_parse_rejects_bad_value() {
        let err = parse_hardware_config("ADC_SAMPLES = lots\n", 10).unwrap_err();
        assert!(matches!(err, RadarError::Config(_)));
    }

    #[test]
    fn test_derived_quantities() {
        let config =
            RadarConfiguration::from_parameters(&HardwareParameters::iwr1843_default()).unwrap();

        assert_eq!(config.tx_antennas(), 3);
        assert_eq!(config.chirps_per_frame(), 384);
        assert_eq!(config.raw_frame_len(), 384 * 4 * 128 * 2);

        let wavelength = SPEED_OF_LIGHT / 77e9;
        assert_relative_eq!(config.wavelength_m(), wavelength, max_relative = 1e-12);

        let bandwidth = 29.982e12 * 60e-6;
        assert_relative_eq!(config.bandwidth_hz(), bandwidth, max_relative = 1e-12);
        assert_relative_eq!(
            config.range_resolution(),
            SPEED_OF_LIGHT / (2.0 * bandwidth),
            max_relative = 1e-12
        );
        assert_relative_eq!(
            config.max_range(),
            config.range_resolution() * 128.0,
            max_relative = 1e-12
        );

        let separation = 160e-6 * 3.0;
        assert_relative_eq!(
            config.doppler_resolution(),
            wavelength / (2.0 * 128.0 * separation),
            max_relative = 1e-9
        );
        assert_relative_eq!(
            config.max_doppler(),
            wavelength / (4.0 * separation),
            max_relative = 1e-9
        );
        assert_relative_eq!(config.min_periodicity_ms(), 61.44, max_relative = 1e-9);
    }

    #[test]
    fn test_summary_lists_radar_quantities() {
        let config =
            RadarConfiguration::from_parameters(&HardwareParameters::iwr1843_default()).unwrap();
        let summary = config.to_string();
        for label in [
            "Bandwidth",
            "Chirps per frame: 384",
            "Range bins: 128",
            "Doppler bins: 128",
            "Max Doppler",
        ] {
            assert!(summary.contains(label), "missing {label} in {summary}");
        }
        assert!(!summary.contains("Azimuth bins"));
    }

    #[test]
    fn test_missing_parameter() {
        let mut params = HardwareParameters::iwr1843_default();
        params.0.remove("ADC_SAMPLES");
        let err = RadarConfiguration::from_parameters(&params).unwrap_err();
        assert!(err.to_string().contains("ADC_SAMPLES"));
    }

    #[test]
    fn test_non_positive_slope_rejected() {
        let mut params = HardwareParameters::iwr1843_default();
        params.insert("FREQ_SLOPE", 0.0);
        assert!(matches!(
            RadarConfiguration::from_parameters(&params),
            Err(RadarError::Config(_))
        ));

        let mut params = HardwareParameters::iwr1843_default();
        params.insert("RAMP_END_TIME", -5.0);
        assert!(RadarConfiguration::from_parameters(&params).is_err());
    }

    #[test]
    fn test_no_tx_enabled_rejected() {
        let mut params = HardwareParameters::iwr1843_default();
        for key in TX_ENABLE_KEYS {
            params.insert(key, 0.0);
        }
        assert!(RadarConfiguration::from_parameters(&params).is_err());
    }

    #[test]
    fn test_processing_config_toml_overrides() {
        let config = ProcessingConfig::from_toml_str("azimuth_bins = 128\n").unwrap();
        assert_eq!(config.azimuth_bins, 128);
        assert_eq!(config.near_field_bins, NEAR_FIELD_BINS);
        assert_eq!(config.doppler_padding, DOPPLER_PADDING);

        assert!(ProcessingConfig::from_toml_str("doppler_padding = 0\n").is_err());
    }
}
