//! # Options Module
//!
//! Configuration for a spectrogram session, persisted as JSON so a viewer can
//! keep its settings between runs.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fft::order_for_size;
use crate::render::{validate_display_size, FrequencyScale};
use crate::stft::{validate_smoothing, DEFAULT_FFT_SIZE, DEFAULT_SMOOTHING};

/// Everything needed to build a [`crate::spectrogram::Spectrogram`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrogramOptions {
    /// Analysis frame length; a power of two of at least 4.
    pub fft_size: usize,
    /// Weight of the newest hop in the per-bin moving average, in `(0, 1]`.
    pub smoothing_coefficient: f32,
    pub frequency_scale: FrequencyScale,
    pub display_width: usize,
    pub display_height: usize,
}

impl Default for SpectrogramOptions {
    fn default() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            smoothing_coefficient: DEFAULT_SMOOTHING,
            frequency_scale: FrequencyScale::Logarithmic,
            display_width: 600,
            display_height: 400,
        }
    }
}

impl SpectrogramOptions {
    /// Transform order derived from `fft_size`.
    pub fn order(&self) -> crate::Result<u32> {
        order_for_size(self.fft_size)
    }

    /// Checks every field without building anything.
    pub fn validate(&self) -> crate::Result<()> {
        self.order()?;
        validate_smoothing(self.smoothing_coefficient)?;
        validate_display_size(self.display_width, self.display_height)
    }
}

/// Reads and validates options from a JSON file.
pub fn load_options(path: impl AsRef<Path>) -> Result<SpectrogramOptions> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read options from {}", path.display()))?;
    let options: SpectrogramOptions = serde_json::from_str(&data)
        .with_context(|| format!("failed to parse options in {}", path.display()))?;
    options
        .validate()
        .with_context(|| format!("invalid options in {}", path.display()))?;
    debug!(path = %path.display(), ?options, "loaded options");
    Ok(options)
}

/// Like [`load_options`], but a missing file yields the defaults.
pub fn load_options_or_default(path: impl AsRef<Path>) -> Result<SpectrogramOptions> {
    let path = path.as_ref();
    if !path.exists() {
        info!(path = %path.display(), "no options file, using defaults");
        return Ok(SpectrogramOptions::default());
    }
    load_options(path)
}

/// Writes options as pretty-printed JSON.
pub fn save_options(path: impl AsRef<Path>, options: &SpectrogramOptions) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(options).context("failed to serialise options")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write options to {}", path.display()))?;
    info!(path = %path.display(), "saved options");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpectraError;
    use crate::render::MAX_DISPLAY_DIMENSION;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("spectra-options-{}-{name}.json", std::process::id()))
    }

    #[test]
    fn defaults_match_session_defaults() {
        let options = SpectrogramOptions::default();
        assert_eq!(options.fft_size, 1024);
        assert_eq!(options.smoothing_coefficient, 0.8);
        assert_eq!(options.order().unwrap(), 10);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn validate_reports_first_bad_field() {
        let options = SpectrogramOptions {
            fft_size: 1000,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(SpectraError::InvalidFrameSize(1000)));

        let options = SpectrogramOptions {
            smoothing_coefficient: 0.0,
            ..Default::default()
        };
        assert_eq!(options.validate(), Err(SpectraError::InvalidSmoothing(0.0)));

        let options = SpectrogramOptions {
            display_height: 0,
            ..Default::default()
        };
        assert!(matches!(options.validate(), Err(SpectraError::InvalidDisplaySize { .. })));
    }

    #[test]
    fn validate_rejects_oversized_display() {
        let options = SpectrogramOptions {
            fft_size: 64,
            display_width: usize::MAX / 8,
            display_height: 3,
            ..Default::default()
        };
        assert_eq!(
            options.validate(),
            Err(SpectraError::InvalidDisplaySize {
                width: usize::MAX / 8,
                height: 3,
            })
        );
        assert!(crate::Spectrogram::new(&options).is_err());

        let options = SpectrogramOptions {
            display_width: MAX_DISPLAY_DIMENSION,
            display_height: MAX_DISPLAY_DIMENSION + 1,
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn load_rejects_oversized_display() {
        let path = temp_path("oversized");
        fs::write(&path, r#"{ "display_width": 100000000000, "display_height": 400 }"#).unwrap();
        assert!(load_options(&path).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options: SpectrogramOptions =
            serde_json::from_str(r#"{ "fft_size": 2048, "frequency_scale": "linear" }"#).unwrap();
        assert_eq!(options.fft_size, 2048);
        assert_eq!(options.frequency_scale, FrequencyScale::Linear);
        assert_eq!(options.smoothing_coefficient, DEFAULT_SMOOTHING);
        assert_eq!(options.display_width, 600);
    }

    #[test]
    fn save_then_load() {
        let path = temp_path("roundtrip");
        let options = SpectrogramOptions {
            fft_size: 512,
            smoothing_coefficient: 0.5,
            frequency_scale: FrequencyScale::Linear,
            display_width: 320,
            display_height: 240,
        };
        save_options(&path, &options).unwrap();
        let loaded = load_options(&path).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, options);
    }

    #[test]
    fn load_rejects_invalid_values() {
        let path = temp_path("invalid");
        fs::write(&path, r#"{ "fft_size": 3 }"#).unwrap();
        let err = load_options(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(format!("{err:#}").contains("power of two"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_path("absent");
        let options = load_options_or_default(&path).unwrap();
        assert_eq!(options, SpectrogramOptions::default());
        assert!(load_options(&path).is_err());
    }
}
