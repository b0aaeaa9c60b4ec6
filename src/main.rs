use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mmwave_radar::acquisition::{FrameSource, StreamSource};
use mmwave_radar::config::load_hardware_config;
use mmwave_radar::organize::IqLayout;
use mmwave_radar::output::{HeatmapOutput, OutputFormat, create_formatter};
use mmwave_radar::{
    DeviceModel, FrameProcessor, HeatmapKind, ProcessingConfig, RadarConfiguration, RawFrame,
    SessionRecord,
};

#[derive(Parser, Debug)]
#[command(name = "mmwave_radar")]
#[command(about = "Process FMCW radar recordings into range, Doppler and angle heatmaps")]
struct Cli {
    /// Increase log verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the derived radar configuration
    Info {
        /// Hardware configuration file (KEY = VALUE lines)
        #[arg(long, conflicts_with = "session")]
        hardware: Option<PathBuf>,

        /// Recorded session whose configuration is shown
        #[arg(long)]
        session: Option<PathBuf>,
    },
    /// Run heatmaps over recorded frames
    Process {
        /// Recorded session (JSON)
        #[arg(long, required_unless_present = "raw")]
        session: Option<PathBuf>,

        /// Raw little-endian capture file; requires --hardware
        #[arg(long, requires = "hardware", conflicts_with = "session")]
        raw: Option<PathBuf>,

        /// Hardware configuration file for raw captures
        #[arg(long)]
        hardware: Option<PathBuf>,

        /// Processing constants (TOML)
        #[arg(long)]
        processing: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value = "range")]
        kind: HeatmapKind,

        #[arg(short, long, value_enum, default_value = "iwr1843")]
        device: DeviceModel,

        #[arg(long, value_enum, default_value = "interleaved")]
        iq_layout: IqLayout,

        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// First frame to process
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Number of frames to process (all remaining when absent)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Report range-profile peaks above this magnitude
        #[arg(long)]
        peak_threshold: Option<f64>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Info { hardware, session } => info(hardware, session),
        Command::Process {
            session,
            raw,
            hardware,
            processing,
            kind,
            device,
            iq_layout,
            format,
            start,
            count,
            peak_threshold,
        } => {
            let (radar, frames) = load_frames(session, raw, hardware)?;
            let processing = match processing {
                Some(path) => ProcessingConfig::load(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?,
                None => ProcessingConfig::default(),
            };
            let processor =
                FrameProcessor::new(radar, processing, device)?.with_iq_layout(iq_layout);
            log::info!("Configuration:\n{}", processor.radar());

            let end = count.map_or(frames.len(), |n| (start + n).min(frames.len()));
            let selected = frames.get(start..end).unwrap_or_default();
            if selected.is_empty() {
                anyhow::bail!("No frames in range {start}..{end} ({} recorded)", frames.len());
            }

            let formatter = create_formatter(format, cli.verbose > 0);
            if let Some(header) = formatter.header() {
                println!("{header}");
            }
            for (offset, raw) in selected.iter().enumerate() {
                let frame = start + offset;
                let cube = processor
                    .prepare(raw)
                    .with_context(|| format!("Frame {frame} failed"))?;
                let matrix = processor
                    .heatmap_from_cube(&cube, kind)
                    .with_context(|| format!("Frame {frame} failed"))?;
                println!(
                    "{}",
                    formatter.format(&HeatmapOutput {
                        frame,
                        kind,
                        matrix: &matrix,
                    })
                );

                if let Some(threshold) = peak_threshold {
                    let profile = processor.range_profile_from_cube(&cube);
                    for (range, magnitude) in profile.peaks(threshold) {
                        eprintln!("Frame {frame}: peak {magnitude:.1} at {range:.2} m");
                    }
                }
            }
            Ok(())
        }
    }
}

fn info(hardware: Option<PathBuf>, session: Option<PathBuf>) -> Result<()> {
    let radar = match (hardware, session) {
        (Some(path), _) => {
            let params = load_hardware_config(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            RadarConfiguration::from_parameters(&params)?
        }
        (None, Some(path)) => {
            let session = SessionRecord::load(&path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            println!(
                "Session '{}' ({}), {} frames recorded {}",
                session.description, session.id, session.frames, session.date
            );
            session.radar_configuration()?
        }
        (None, None) => anyhow::bail!("Pass --hardware or --session"),
    };
    println!("{radar}");
    Ok(())
}

fn load_frames(
    session: Option<PathBuf>,
    raw: Option<PathBuf>,
    hardware: Option<PathBuf>,
) -> Result<(RadarConfiguration, Vec<RawFrame>)> {
    if let Some(path) = session {
        let session = SessionRecord::load(&path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        let radar = session.radar_configuration()?;
        return Ok((radar, session.data));
    }

    let (Some(raw), Some(hardware)) = (raw, hardware) else {
        anyhow::bail!("Pass --session, or --raw with --hardware");
    };
    let params = load_hardware_config(&hardware)
        .with_context(|| format!("Failed to read {}", hardware.display()))?;
    let radar = RadarConfiguration::from_parameters(&params)?;

    let file = File::open(&raw).with_context(|| format!("Failed to open {}", raw.display()))?;
    let mut source = StreamSource::new(BufReader::new(file), radar.raw_frame_len());
    let mut frames = Vec::new();
    while let Some(frame) = source.read()? {
        frames.push(frame);
    }
    log::info!("Read {} frames from {}", frames.len(), raw.display());
    Ok((radar, frames))
}
