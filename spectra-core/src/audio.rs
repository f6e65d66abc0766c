//! # Audio Capture Module
//!
//! Microphone input for live spectrograms. With the `capture` feature the
//! default input device is opened through CPAL; every interleaved callback
//! buffer is averaged down to mono and forwarded in fixed-size chunks over a
//! crossbeam channel. A [`Recording`] on the receiving side collects the chunks
//! into the mono buffer a [`crate::spectrogram::Spectrogram`] analyses.

use tracing::debug;

/// Samples per chunk sent to the analysis side (~46 ms at 44.1 kHz).
pub const CHUNK_SIZE: usize = 2048;

/// Preferred capture rate.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;

/// Appends the per-frame mean of interleaved `data` to `out`.
///
/// A trailing partial frame is dropped.
pub fn downmix_interleaved(data: &[f32], channels: usize, out: &mut Vec<f32>) {
    match channels {
        0 => {}
        1 => out.extend_from_slice(data),
        n => {
            let scale = 1.0 / n as f32;
            out.extend(data.chunks_exact(n).map(|frame| frame.iter().sum::<f32>() * scale));
        }
    }
}

/// A growing mono buffer fed from capture chunks.
///
/// When a maximum length is set the oldest samples are discarded, so the
/// recording behaves as a sliding window over the most recent audio.
#[derive(Debug, Clone, Default)]
pub struct Recording {
    samples: Vec<f32>,
    sample_rate: u32,
    max_len: Option<usize>,
}

impl Recording {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
            max_len: None,
        }
    }

    /// Keeps at most `max_len` of the newest samples.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self.trim();
        self
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn push(&mut self, chunk: &[f32]) {
        self.samples.extend_from_slice(chunk);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Hands the buffered samples over and starts empty.
    pub fn take(&mut self) -> Vec<f32> {
        debug!(samples = self.samples.len(), "took recording");
        std::mem::take(&mut self.samples)
    }

    fn trim(&mut self) {
        if let Some(max) = self.max_len {
            if self.samples.len() > max {
                let excess = self.samples.len() - max;
                self.samples.drain(..excess);
            }
        }
    }
}

#[cfg(feature = "capture")]
pub use self::capture::{start_audio_capture, AudioCapture};

#[cfg(feature = "capture")]
mod capture {
    use anyhow::{anyhow, Context, Result};
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::SupportedStreamConfigRange;
    use crossbeam_channel::Sender;
    use tracing::{info, warn};

    use super::{downmix_interleaved, CHUNK_SIZE, TARGET_SAMPLE_RATE};

    /// A running input stream. Dropping it stops capture.
    pub struct AudioCapture {
        stream: cpal::Stream,
        sample_rate: u32,
        channels: u16,
    }

    impl std::fmt::Debug for AudioCapture {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AudioCapture")
                .field("sample_rate", &self.sample_rate)
                .field("channels", &self.channels)
                .finish_non_exhaustive()
        }
    }

    impl AudioCapture {
        pub fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        /// Channel count of the device stream before downmixing.
        pub fn channels(&self) -> u16 {
            self.channels
        }

        pub fn pause(&self) -> Result<()> {
            self.stream.pause().context("failed to pause input stream")
        }

        pub fn resume(&self) -> Result<()> {
            self.stream.play().context("failed to resume input stream")
        }
    }

    /// Starts capturing from the default input device, sending mono chunks of
    /// [`CHUNK_SIZE`] samples to `sender`.
    ///
    /// Chunks are dropped rather than blocking the audio callback when the
    /// channel is full.
    pub fn start_audio_capture(sender: Sender<Vec<f32>>) -> Result<AudioCapture> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow!("no input device available"))?;
        info!(device = %device.name().unwrap_or_else(|_| "<unnamed>".into()), "using audio input device");

        let configs = device
            .supported_input_configs()
            .context("failed to query input configurations")?
            .collect::<Vec<_>>();
        let supported = find_supported_config(configs, TARGET_SAMPLE_RATE)
            .ok_or_else(|| anyhow!("no suitable f32 input format found"))?;

        let rate = TARGET_SAMPLE_RATE.clamp(supported.min_sample_rate().0, supported.max_sample_rate().0);
        let config = supported.with_sample_rate(cpal::SampleRate(rate));
        let sample_rate = config.sample_rate().0;
        let channels = config.channels();
        let config: cpal::StreamConfig = config.into();
        info!(sample_rate, channels, "selected input configuration");

        let mut pending = Vec::with_capacity(CHUNK_SIZE * 2);
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                downmix_interleaved(data, channels as usize, &mut pending);
                while pending.len() >= CHUNK_SIZE {
                    let chunk = pending[..CHUNK_SIZE].to_vec();
                    let _ = sender.try_send(chunk);
                    pending.drain(..CHUNK_SIZE);
                }
            },
            |err| warn!(%err, "audio input stream error"),
            None,
        )?;

        stream.play().context("failed to start input stream")?;

        Ok(AudioCapture {
            stream,
            sample_rate,
            channels,
        })
    }

    /// Picks an `f32` configuration whose rate range lies closest to
    /// `target_rate`, preferring fewer channels on a tie.
    fn find_supported_config(
        configs: Vec<SupportedStreamConfigRange>,
        target_rate: u32,
    ) -> Option<SupportedStreamConfigRange> {
        configs
            .into_iter()
            .filter(|c| c.sample_format() == cpal::SampleFormat::F32 && c.channels() > 0)
            .min_by_key(|c| {
                let min = c.min_sample_rate().0;
                let max = c.max_sample_rate().0;
                let distance = if target_rate < min {
                    min - target_rate
                } else {
                    target_rate.saturating_sub(max)
                };
                (distance, c.channels())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_each_frame() {
        let mut out = Vec::new();
        downmix_interleaved(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn downmix_passes_mono_through_and_drops_partial_frames() {
        let mut out = vec![9.0];
        downmix_interleaved(&[0.1, 0.2], 1, &mut out);
        assert_eq!(out, vec![9.0, 0.1, 0.2]);

        let mut out = Vec::new();
        downmix_interleaved(&[3.0, 3.0, 3.0, 1.0], 3, &mut out);
        assert_eq!(out, vec![3.0]);

        let mut out = Vec::new();
        downmix_interleaved(&[1.0], 0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn recording_accumulates_chunks() {
        let mut recording = Recording::new(8);
        recording.push(&[1.0; 4]);
        recording.push(&[2.0; 4]);
        assert_eq!(recording.len(), 8);
        assert_eq!(recording.duration_secs(), 1.0);
        let samples = recording.take();
        assert_eq!(samples.len(), 8);
        assert!(recording.is_empty());
    }

    #[test]
    fn bounded_recording_keeps_newest_samples() {
        let mut recording = Recording::new(44_100).with_max_len(5);
        recording.push(&[1.0, 2.0, 3.0]);
        recording.push(&[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(recording.samples(), &[3.0, 4.0, 5.0, 6.0, 7.0]);
        recording.clear();
        assert!(recording.is_empty());
    }
}
