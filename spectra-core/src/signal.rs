//! # Utility Signal Module
//!
//! Synthetic test signals for exercising the analyzer without a microphone:
//! white noise in two flavours, pink noise, a unit impulse and a plain sine.
//! Randomness comes from a caller-supplied [`Rng`] so results can be seeded.

use std::f32::consts::PI;

use rand::Rng;

const PINK_A: [f32; 5] = [3.8024, 2.9694, 2.5970, 3.0870, 3.4006];
const PINK_SUM: [f32; 5] = [0.00198, 0.01478, 0.06378, 0.23378, 0.91578];
const PINK_NORMALISER: f32 = 15.8564;

/// Kinds of generated noise and test signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UtilitySignal {
    #[default]
    Uniform,
    Gaussian,
    Pink,
    Impulse,
}

impl UtilitySignal {
    pub fn name(self) -> &'static str {
        match self {
            UtilitySignal::Uniform => "Uniform noise",
            UtilitySignal::Gaussian => "Gaussian noise",
            UtilitySignal::Pink => "Pink noise",
            UtilitySignal::Impulse => "Impulse",
        }
    }
}

impl std::fmt::Display for UtilitySignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Generates `length` samples of `kind`.
pub fn generate<R: Rng>(kind: UtilitySignal, length: usize, rng: &mut R) -> Vec<f32> {
    match kind {
        UtilitySignal::Uniform => (0..length).map(|_| rng.random::<f32>() - 0.5).collect(),
        UtilitySignal::Gaussian => (0..length).map(|_| gaussian(rng)).collect(),
        UtilitySignal::Pink => {
            let mut pink = PinkNoise::default();
            (0..length).map(|_| pink.next(rng)).collect()
        }
        UtilitySignal::Impulse => {
            let mut samples = vec![0.0; length];
            if let Some(first) = samples.first_mut() {
                *first = 1.0;
            }
            samples
        }
    }
}

/// Box–Muller, half scale.
fn gaussian<R: Rng>(rng: &mut R) -> f32 {
    // r1 in (0, 1] keeps the log finite.
    let r1 = 1.0 - rng.random::<f32>();
    let r2 = rng.random::<f32>();
    (-2.0 * r1.ln()).sqrt() * (2.0 * PI * r2).cos() * 0.5
}

/// Five-generator pink noise filter.
#[derive(Debug, Clone, Default)]
struct PinkNoise {
    contributions: [f32; 5],
}

impl PinkNoise {
    fn next<R: Rng>(&mut self, rng: &mut R) -> f32 {
        let pick = rng.random::<f32>();
        let value = rng.random::<f32>();
        if let Some(i) = PINK_SUM.iter().position(|&threshold| pick <= threshold) {
            self.contributions[i] = 2.0 * (value - 0.5) * PINK_A[i];
        }
        self.contributions.iter().sum::<f32>() / PINK_NORMALISER
    }
}

/// A sine of `frequency` Hz sampled at `sample_rate`.
pub fn sine(frequency: f32, sample_rate: f32, length: usize, amplitude: f32) -> Vec<f32> {
    let step = 2.0 * PI * frequency / sample_rate;
    (0..length).map(|i| amplitude * (step * i as f32).sin()).collect()
}
