use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mmwave_radar::organize::IqLayout;
use mmwave_radar::simulation::{AdditiveNoiseConfig, FrameGenerator, SceneConfig, Target};
use mmwave_radar::{RadarConfiguration, SessionRecord};

#[derive(Parser, Debug)]
#[command(name = "generate_session")]
#[command(about = "Generate a synthetic radar session with point targets and noise")]
struct Args {
    /// TOML scene file
    #[arg(short, long)]
    scene: Option<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = "data/synthetic")]
    output_dir: PathBuf,

    /// Number of frames (overrides the scene file)
    #[arg(short = 'n', long)]
    frames: Option<usize>,

    /// Extra target as "range,azimuth[,velocity]"
    #[arg(short, long)]
    target: Vec<String>,

    /// Seed for reproducibility (overrides the scene file)
    #[arg(long)]
    seed: Option<u64>,

    /// AWGN SNR in dB (overrides the scene file)
    #[arg(long)]
    snr: Option<f64>,

    /// Session description
    #[arg(short, long)]
    description: Option<String>,

    #[arg(long, value_enum, default_value = "interleaved")]
    iq_layout: IqLayout,
}

fn parse_target(s: &str) -> Result<Target> {
    let values: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>().context("Invalid target value"))
        .collect::<Result<_>>()?;
    match values.as_slice() {
        [range, azimuth] => Ok(Target::at_range(*range).with_azimuth(*azimuth)),
        [range, azimuth, velocity] => Ok(Target::at_range(*range)
            .with_azimuth(*azimuth)
            .with_velocity(*velocity)),
        _ => anyhow::bail!("Invalid target '{s}'. Use 'range,azimuth[,velocity]'"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut scene = match &args.scene {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => SceneConfig::from_toml_str("")?,
    };
    for raw in &args.target {
        scene.targets.push(parse_target(raw)?);
    }
    if scene.targets.is_empty() {
        scene.targets.push(Target::at_range(2.0));
    }
    if let Some(seed) = args.seed {
        scene.noise.seed = Some(seed);
    }
    if let Some(snr_db) = args.snr {
        scene.noise.additive = Some(AdditiveNoiseConfig { snr_db });
    }
    let frames = args.frames.unwrap_or(scene.frames);
    let description = args.description.clone().unwrap_or(scene.description.clone());

    let params = scene.hardware_parameters();
    let radar = RadarConfiguration::from_parameters(&params)?;
    log::info!("Configuration:\n{radar}");

    let mut generator =
        FrameGenerator::new(radar, scene.device, scene.targets.clone(), scene.noise.clone())?
            .with_iq_layout(args.iq_layout);
    let data = generator.frames(frames)?;

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;
    let session = SessionRecord::new(description, params, data, Vec::new());
    let path = session
        .save_in(&args.output_dir)
        .context("Failed to write session")?;

    eprintln!(
        "Generated {} frames of {} targets in {}",
        frames,
        scene.targets.len(),
        path.display()
    );
    Ok(())
}
