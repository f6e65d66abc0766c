//! # Spectrogram Session Module
//!
//! Ties the pieces together: a [`Spectrogram`] holds one mono signal, one
//! [`StftAnalyzer`] and one [`SpectrogramRenderer`], and turns the signal into
//! a finished RGBA image on request. Every draw is a full recomputation.

use tracing::{debug, trace};

use crate::error::{Result, SpectraError};
use crate::options::SpectrogramOptions;
use crate::render::{DisplaySink, FrequencyScale, PixelBuffer, SpectrogramRenderer};
use crate::stft::{MagnitudeMatrix, StftAnalyzer};

/// Averages equally long channels into one mono signal.
pub fn downmix(channels: &[&[f32]]) -> Result<Vec<f32>> {
    let (first, rest) = channels.split_first().ok_or(SpectraError::NoChannels)?;
    let expected = first.len();
    for (i, channel) in rest.iter().enumerate() {
        if channel.len() != expected {
            return Err(SpectraError::ChannelLengthMismatch {
                channel: i + 1,
                expected,
                actual: channel.len(),
            });
        }
    }

    if rest.is_empty() {
        return Ok(first.to_vec());
    }
    let scale = 1.0 / channels.len() as f32;
    let mut mono = first.to_vec();
    for channel in rest {
        for (m, &s) in mono.iter_mut().zip(channel.iter()) {
            *m += s;
        }
    }
    mono.iter_mut().for_each(|m| *m *= scale);
    Ok(mono)
}

/// One analysis and rendering session over a buffered signal.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    analyzer: StftAnalyzer,
    renderer: SpectrogramRenderer,
    samples: Option<Vec<f32>>,
}

impl Spectrogram {
    pub fn new(options: &SpectrogramOptions) -> Result<Self> {
        options.validate()?;
        let analyzer = StftAnalyzer::new(options.order()?, options.smoothing_coefficient)?;
        let renderer = SpectrogramRenderer::new(
            options.display_width,
            options.display_height,
            options.frequency_scale,
        )?;
        Ok(Self {
            analyzer,
            renderer,
            samples: None,
        })
    }

    pub fn analyzer(&self) -> &StftAnalyzer {
        &self.analyzer
    }

    pub fn renderer(&self) -> &SpectrogramRenderer {
        &self.renderer
    }

    pub fn set_scale(&mut self, scale: FrequencyScale) {
        self.renderer.set_scale(scale);
    }

    /// Replaces the signal with the mean of `channels`.
    pub fn set_channels(&mut self, channels: &[&[f32]]) -> Result<()> {
        let mono = downmix(channels)?;
        debug!(channels = channels.len(), samples = mono.len(), "set channel data");
        self.samples = Some(mono);
        Ok(())
    }

    /// Replaces the signal with samples that are already mono.
    pub fn set_mono(&mut self, samples: Vec<f32>) {
        debug!(samples = samples.len(), "set mono data");
        self.samples = Some(samples);
    }

    pub fn samples(&self) -> Option<&[f32]> {
        self.samples.as_deref()
    }

    pub fn clear(&mut self) {
        self.samples = None;
    }

    /// Analyses the current signal from a clean smoothing state.
    pub fn analyze(&mut self) -> Result<MagnitudeMatrix> {
        let samples = self.samples.as_deref().ok_or(SpectraError::MissingChannelData)?;
        Ok(self.analyzer.analyze(samples))
    }

    /// The unscaled `num_hops × N/2` image.
    pub fn render_offscreen(&mut self) -> Result<PixelBuffer> {
        let matrix = self.analyze()?;
        Ok(SpectrogramRenderer::render_offscreen(&matrix))
    }

    /// Renders at the configured display size.
    ///
    /// # Returns
    /// An RGBA frame of `display_width × display_height` pixels with bin 0 at
    /// the bottom, or [`SpectraError::MissingChannelData`] before any channel
    /// data was set.
    pub fn draw(&mut self) -> Result<PixelBuffer> {
        let matrix = self.analyze()?;
        Ok(self.renderer.render(&matrix))
    }

    /// Renders at the sink's current size and presents the result.
    pub fn draw_to(&mut self, sink: &mut impl DisplaySink) -> Result<()> {
        let (width, height) = sink.size();
        let renderer = SpectrogramRenderer::new(width, height, self.renderer.scale())?;
        let matrix = self.analyze()?;
        trace!(width, height, hops = matrix.num_hops(), "presenting spectrogram");
        sink.present(renderer.render(&matrix));
        Ok(())
    }
}
