//! # Short-Time Fourier Transform Module
//!
//! Slices a fully buffered mono signal into half-overlapping frames, windows
//! each frame, transforms it, and turns the first `N/2` bins into a smoothed,
//! decibel-like magnitude matrix ready for colour mapping.
//!
//! ## Pipeline per hop
//! 1. Take `N` samples starting at `hop · N/2` (a short tail is zero-padded)
//! 2. Multiply by the Blackman window
//! 3. Real FFT
//! 4. `d = 20·ln(|X[b]|/N + 1)` for every bin `b < N/2`
//! 5. Exponential smoothing against the same bin of the previous hop

use std::time::Instant;

use tracing::debug;

use crate::error::{Result, SpectraError};
use crate::fft::{ComplexBuffer, FftEngine};
use crate::window::AnalysisWindow;

/// Frame size used when no options are given.
pub const DEFAULT_FFT_SIZE: usize = 1024;

/// Weight of the newest hop in the per-bin moving average.
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// Decibel-like compression of a spectral magnitude: `20·ln(scaler·m + 1)`.
///
/// Not a calibrated level; zero maps to zero and the curve grows slowly.
#[inline]
pub fn decibel(magnitude: f32, scaler: f32) -> f32 {
    20.0 * (scaler * magnitude + 1.0).ln()
}

/// Number of analysis hops for a signal: `floor(len / (N/2))`, or zero when
/// the signal does not fill a single frame.
pub fn number_of_hops(signal_len: usize, frame_size: usize) -> usize {
    if signal_len < frame_size {
        0
    } else {
        signal_len / (frame_size / 2)
    }
}

/// Checks that a smoothing coefficient lies in `(0, 1]`.
pub fn validate_smoothing(coefficient: f32) -> Result<f32> {
    if coefficient.is_finite() && coefficient > 0.0 && coefficient <= 1.0 {
        Ok(coefficient)
    } else {
        Err(SpectraError::InvalidSmoothing(coefficient))
    }
}

/// Per-bin exponential moving average carried from hop to hop.
///
/// The state only makes sense when hops are fed in order; replaying a single
/// hop without its predecessors gives a different value.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingState {
    coefficient: f32,
    values: Vec<f32>,
}

impl SmoothingState {
    pub fn new(num_bins: usize, coefficient: f32) -> Result<Self> {
        Ok(Self {
            coefficient: validate_smoothing(coefficient)?,
            values: vec![0.0; num_bins],
        })
    }

    pub fn coefficient(&self) -> f32 {
        self.coefficient
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Forgets all history; the next hop starts from zero again.
    pub fn reset(&mut self) {
        self.values.fill(0.0);
    }

    /// `v = v·(1 − α) + raw·α`, returning the new value.
    #[inline]
    pub fn update(&mut self, bin: usize, raw: f32) -> f32 {
        let alpha = self.coefficient;
        let value = &mut self.values[bin];
        *value = *value * (1.0 - alpha) + raw * alpha;
        *value
    }
}

/// Smoothed magnitudes indexed by `(hop, bin)`, stored hop-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MagnitudeMatrix {
    num_hops: usize,
    num_bins: usize,
    values: Vec<f32>,
}

impl MagnitudeMatrix {
    pub fn new(num_hops: usize, num_bins: usize) -> Self {
        Self {
            num_hops,
            num_bins,
            values: vec![0.0; num_hops * num_bins],
        }
    }

    /// Wraps hop-major values.
    ///
    /// # Panics
    /// If `values` does not hold exactly `num_hops · num_bins` entries.
    pub fn from_values(num_hops: usize, num_bins: usize, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            num_hops * num_bins,
            "magnitude matrix needs num_hops * num_bins values"
        );
        Self {
            num_hops,
            num_bins,
            values,
        }
    }

    pub fn num_hops(&self) -> usize {
        self.num_hops
    }

    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, hop: usize, bin: usize) -> f32 {
        self.values[hop * self.num_bins + bin]
    }

    /// All bins of one hop.
    pub fn hop(&self, hop: usize) -> &[f32] {
        let start = hop * self.num_bins;
        &self.values[start..start + self.num_bins]
    }

    fn hop_mut(&mut self, hop: usize) -> &mut [f32] {
        let start = hop * self.num_bins;
        &mut self.values[start..start + self.num_bins]
    }

    pub fn hops(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.num_hops).map(move |h| self.hop(h))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    /// Bin with the largest magnitude summed over every hop.
    pub fn dominant_bin(&self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let mut totals = vec![0.0f32; self.num_bins];
        for hop in self.hops() {
            for (total, &value) in totals.iter_mut().zip(hop) {
                *total += value;
            }
        }
        totals
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(bin, _)| bin)
    }
}

/// Turns a mono signal into a [`MagnitudeMatrix`].
///
/// Owns the FFT engine, the analysis window and the smoothing state for one
/// frame size. Input must already be mono; see [`crate::spectrogram::downmix`].
#[derive(Debug, Clone)]
pub struct StftAnalyzer {
    engine: FftEngine,
    window: AnalysisWindow,
    smoothing: SmoothingState,
    frame: Vec<f32>,
    spectrum: ComplexBuffer,
    magnitude_scaler: f32,
}

impl StftAnalyzer {
    /// Creates an analyzer for frames of `2^order` samples.
    pub fn new(order: u32, smoothing: f32) -> Result<Self> {
        Self::with_engine(FftEngine::new(order)?, smoothing)
    }

    pub fn with_engine(engine: FftEngine, smoothing: f32) -> Result<Self> {
        let size = engine.size();
        let half = engine.half_size();
        let analyzer = Self {
            window: AnalysisWindow::blackman(size),
            smoothing: SmoothingState::new(half, smoothing)?,
            frame: vec![0.0; size],
            spectrum: ComplexBuffer::zeros(size),
            magnitude_scaler: 1.0 / size as f32,
            engine,
        };
        debug!(frame_size = size, smoothing, "created STFT analyzer");
        Ok(analyzer)
    }

    pub fn frame_size(&self) -> usize {
        self.engine.size()
    }

    /// Hop size; always half the frame size.
    pub fn hop_size(&self) -> usize {
        self.engine.half_size()
    }

    /// Bins kept per hop (`N/2`).
    pub fn num_bins(&self) -> usize {
        self.engine.half_size()
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    pub fn smoothing(&self) -> &SmoothingState {
        &self.smoothing
    }

    pub fn number_of_hops(&self, signal_len: usize) -> usize {
        number_of_hops(signal_len, self.frame_size())
    }

    /// Clears the smoothing history.
    pub fn reset(&mut self) {
        self.smoothing.reset();
    }

    /// Analyses one frame and advances the smoothing state, writing the
    /// smoothed value of every bin into `out`.
    ///
    /// `frame` may be shorter than `N`; the remainder is silence.
    ///
    /// # Panics
    /// If `frame` is longer than `N` or `out` is not `N/2` long.
    pub fn process_hop(&mut self, frame: &[f32], out: &mut [f32]) {
        assert_eq!(out.len(), self.num_bins(), "hop output must hold N/2 bins");
        self.window.apply(frame, &mut self.frame);
        self.engine
            .rfft(&self.frame, &mut self.spectrum.real, &mut self.spectrum.imag);

        for (bin, slot) in out.iter_mut().enumerate() {
            let raw = decibel(self.spectrum.magnitude(bin), self.magnitude_scaler);
            *slot = self.smoothing.update(bin, raw);
        }
    }

    /// Analyses a whole signal from scratch.
    ///
    /// The smoothing state is reset first, so analysing the same signal twice
    /// yields the same matrix.
    ///
    /// # Arguments
    /// * `samples` - Mono signal; frames past its end are zero-padded
    ///
    /// # Returns
    /// A `num_hops × N/2` matrix of smoothed decibel values, empty when the
    /// signal is shorter than one frame.
    pub fn analyze(&mut self, samples: &[f32]) -> MagnitudeMatrix {
        let started = Instant::now();
        let num_hops = self.number_of_hops(samples.len());
        let hop_size = self.hop_size();
        let frame_size = self.frame_size();
        let mut matrix = MagnitudeMatrix::new(num_hops, self.num_bins());

        self.reset();
        for hop in 0..num_hops {
            let start = hop * hop_size;
            let end = (start + frame_size).min(samples.len());
            self.process_hop(&samples[start..end], matrix.hop_mut(hop));
        }

        debug!(
            samples = samples.len(),
            hops = num_hops,
            bins = self.num_bins(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "analysed signal"
        );
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone(bin: usize, frame_size: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / frame_size as f32).sin())
            .collect()
    }

    #[test]
    fn hop_count_is_floor_of_half_frames() {
        assert_eq!(number_of_hops(0, 1024), 0);
        assert_eq!(number_of_hops(1023, 1024), 0);
        assert_eq!(number_of_hops(1024, 1024), 2);
        assert_eq!(number_of_hops(1500, 1024), 2);
        assert_eq!(number_of_hops(2048, 1024), 4);
        assert_eq!(number_of_hops(44_100, 1024), 86);
    }

    #[test]
    fn short_signal_gives_empty_matrix() {
        let mut analyzer = StftAnalyzer::new(10, DEFAULT_SMOOTHING).unwrap();
        let matrix = analyzer.analyze(&vec![0.25; 1000]);
        assert!(matrix.is_empty());
        assert_eq!(matrix.num_hops(), 0);
        assert_eq!(matrix.num_bins(), 512);
        assert_eq!(matrix.dominant_bin(), None);
    }

    #[test]
    fn rejects_invalid_smoothing() {
        for bad in [0.0, -0.1, 1.5, f32::NAN] {
            assert!(matches!(
                StftAnalyzer::new(8, bad),
                Err(SpectraError::InvalidSmoothing(_))
            ));
        }
        assert!(StftAnalyzer::new(8, 1.0).is_ok());
    }

    #[test]
    fn decibel_of_silence_is_zero() {
        assert_eq!(decibel(0.0, 1.0 / 1024.0), 0.0);
        let full_scale = decibel(1024.0, 1.0 / 1024.0);
        assert!((full_scale - 20.0 * 2.0f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn silence_stays_at_zero() {
        let mut analyzer = StftAnalyzer::new(8, DEFAULT_SMOOTHING).unwrap();
        let matrix = analyzer.analyze(&vec![0.0; 2048]);
        assert_eq!(matrix.num_hops(), 16);
        assert!(matrix.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn smoothing_converges_geometrically() {
        let alpha = 0.8;
        let target = 3.0;
        let mut state = SmoothingState::new(1, alpha).unwrap();
        let mut previous_gap = target;
        for _ in 0..20 {
            let value = state.update(0, target);
            let gap = target - value;
            assert!((gap - previous_gap * (1.0 - alpha)).abs() < 1e-5);
            previous_gap = gap;
        }
        assert!((state.values()[0] - target).abs() < 1e-5);
    }

    #[test]
    fn first_hop_starts_from_zero_state() {
        let mut analyzer = StftAnalyzer::new(6, 0.5).unwrap();
        let signal = tone(4, 64, 64);
        let mut smoothed = vec![0.0; 32];
        analyzer.process_hop(&signal, &mut smoothed);

        // Same frame with α = 1 gives the raw decibel values.
        let mut raw_analyzer = StftAnalyzer::new(6, 1.0).unwrap();
        let mut raw = vec![0.0; 32];
        raw_analyzer.process_hop(&signal, &mut raw);

        for bin in 0..32 {
            assert!((smoothed[bin] - 0.5 * raw[bin]).abs() < 1e-5);
        }
    }

    #[test]
    fn replaying_a_hop_is_not_idempotent() {
        let mut analyzer = StftAnalyzer::new(6, DEFAULT_SMOOTHING).unwrap();
        let signal = tone(5, 64, 64);
        let mut first = vec![0.0; 32];
        let mut second = vec![0.0; 32];
        analyzer.process_hop(&signal, &mut first);
        analyzer.process_hop(&signal, &mut second);
        assert!(second[5] > first[5]);

        analyzer.reset();
        let mut after_reset = vec![0.0; 32];
        analyzer.process_hop(&signal, &mut after_reset);
        assert_eq!(first, after_reset);
    }

    #[test]
    fn analyze_is_repeatable() {
        let mut analyzer = StftAnalyzer::new(7, DEFAULT_SMOOTHING).unwrap();
        let signal = tone(9, 128, 1000);
        let first = analyzer.analyze(&signal);
        let second = analyzer.analyze(&signal);
        assert_eq!(first, second);
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let mut analyzer = StftAnalyzer::new(8, DEFAULT_SMOOTHING).unwrap();
        let signal = tone(20, 256, 256 * 8);
        let matrix = analyzer.analyze(&signal);
        assert_eq!(matrix.num_hops(), 16);
        assert_eq!(matrix.dominant_bin(), Some(20));

        let hop = matrix.hop(3);
        let peak = hop
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(bin, _)| bin);
        assert_eq!(peak, Some(20));
        assert_eq!(matrix.get(3, 20), hop[20]);
    }

    #[test]
    fn tail_frames_are_zero_padded() {
        // The last hop of a 512-sample signal reaches past the end.
        let mut analyzer = StftAnalyzer::new(8, 1.0).unwrap();
        let signal = vec![0.5; 512];
        let matrix = analyzer.analyze(&signal);
        assert_eq!(matrix.num_hops(), 4);

        let mut padded = vec![0.0; 256];
        padded[..128].fill(0.5);
        let mut expected = vec![0.0; 128];
        analyzer.reset();
        analyzer.process_hop(&padded, &mut expected);
        assert_eq!(matrix.hop(3), expected.as_slice());
    }
}
