use ndarray::{Array3, Axis};
use num_complex::Complex64;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::error::{RadarError, Result};

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct NoiseConfig {
    pub seed: Option<u64>,
    pub additive: Option<AdditiveNoiseConfig>,
    pub phase: Option<PhaseNoiseConfig>,
}

impl NoiseConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_awgn(mut self, snr_db: f64) -> Self {
        self.additive = Some(AdditiveNoiseConfig { snr_db });
        self
    }

    pub fn with_phase_noise(mut self, std_deg: f64) -> Self {
        self.phase = Some(PhaseNoiseConfig { std_deg });
        self
    }

    pub(crate) fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => rand::make_rng(),
        }
    }
}

/// Complex white Gaussian noise relative to the clean signal power
#[derive(Clone, Debug, serde::Deserialize)]
pub struct AdditiveNoiseConfig {
    pub snr_db: f64,
}

/// Random phase offset per chirp, as from oscillator jitter
#[derive(Clone, Debug, serde::Deserialize)]
pub struct PhaseNoiseConfig {
    pub std_deg: f64,
}

/// Mean `|z|^2` over all samples.
pub fn signal_power(signal: &Array3<Complex64>) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    signal.iter().map(|z| z.norm_sqr()).sum::<f64>() / signal.len() as f64
}

fn normal(std: f64) -> Result<Normal<f64>> {
    Normal::new(0.0, std)
        .map_err(|e| RadarError::Config(format!("invalid noise deviation {std}: {e}")))
}

fn apply_additive_noise(
    signal: &mut Array3<Complex64>,
    config: &AdditiveNoiseConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let power = signal_power(signal);
    if power == 0.0 {
        return Ok(());
    }
    let noise_power = power / 10f64.powf(config.snr_db / 10.0);
    let dist = normal((noise_power / 2.0).sqrt())?;
    for z in signal.iter_mut() {
        *z += Complex64::new(dist.sample(rng), dist.sample(rng));
    }
    Ok(())
}

fn apply_phase_noise(
    signal: &mut Array3<Complex64>,
    config: &PhaseNoiseConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let dist = normal(config.std_deg.to_radians())?;
    for mut chirp in signal.axis_iter_mut(Axis(0)) {
        let rotation = Complex64::from_polar(1.0, dist.sample(rng));
        chirp.mapv_inplace(|z| z * rotation);
    }
    Ok(())
}

/// Apply the configured impairments to a `(chirp, rx, sample)` cube.
pub fn apply_noise(
    signal: &mut Array3<Complex64>,
    config: &NoiseConfig,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    if let Some(phase) = &config.phase {
        apply_phase_noise(signal, phase, rng)?;
    }
    if let Some(additive) = &config.additive {
        apply_additive_noise(signal, additive, rng)?;
    }
    Ok(())
}
