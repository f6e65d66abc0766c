//! # Analysis Window Module
//!
//! Blackman weighting applied to every analysis frame before the transform,
//! tapering the frame edges to reduce spectral leakage.

use std::f64::consts::PI;

/// The Blackman `α` parameter.
pub const BLACKMAN_ALPHA: f64 = 0.16;

/// A per-sample weighting curve, generated once per frame size.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisWindow {
    coefficients: Vec<f32>,
}

impl AnalysisWindow {
    /// `w[i] = a0 − a1·cos(2πi/N) + a2·cos(4πi/N)` with
    /// `a0 = (1 − α)/2`, `a1 = 1/2`, `a2 = α/2`.
    ///
    /// The edge value `w[0]` is zero up to rounding; it is clamped so every
    /// coefficient stays within `[0, 1]`.
    pub fn blackman(size: usize) -> Self {
        let a0 = 0.5 * (1.0 - BLACKMAN_ALPHA);
        let a1 = 0.5;
        let a2 = 0.5 * BLACKMAN_ALPHA;
        let coefficients = (0..size)
            .map(|i| {
                let x = i as f64 / size as f64;
                let w = a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos();
                w.clamp(0.0, 1.0) as f32
            })
            .collect();
        Self { coefficients }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Writes `frame[i] · w[i]` into `out`.
    ///
    /// `frame` may be shorter than the window (the tail of a signal); the
    /// missing samples are treated as silence.
    ///
    /// # Panics
    /// If `out` is not exactly the window length, or `frame` is longer.
    pub fn apply(&self, frame: &[f32], out: &mut [f32]) {
        assert_eq!(out.len(), self.len(), "window output must match the window length");
        assert!(
            frame.len() <= self.len(),
            "frame of {} samples exceeds the window length {}",
            frame.len(),
            self.len()
        );
        let (head, tail) = out.split_at_mut(frame.len());
        for ((o, &s), &w) in head.iter_mut().zip(frame).zip(&self.coefficients) {
            *o = s * w;
        }
        tail.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_stay_in_unit_range() {
        for size in [4, 64, 1024] {
            let window = AnalysisWindow::blackman(size);
            assert_eq!(window.len(), size);
            assert!(window.coefficients().iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn edges_are_low_and_centre_is_peak() {
        let window = AnalysisWindow::blackman(1024);
        let w = window.coefficients();
        assert!(w[0] < 1e-6);
        assert!(w[1023] < 1e-4);
        assert!((w[512] - 1.0).abs() < 1e-6);
        let max = w.iter().cloned().fold(0.0f32, f32::max);
        assert_eq!(max, w[512]);
    }

    #[test]
    fn curve_is_symmetric_about_centre() {
        let window = AnalysisWindow::blackman(256);
        let w = window.coefficients();
        for i in 1..128 {
            assert!((w[i] - w[256 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn apply_weights_and_pads_short_frames() {
        let window = AnalysisWindow::blackman(8);
        let mut out = [9.0f32; 8];
        window.apply(&[1.0; 5], &mut out);
        for i in 0..5 {
            assert_eq!(out[i], window.coefficients()[i]);
        }
        assert_eq!(&out[5..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    #[should_panic(expected = "exceeds the window length")]
    fn apply_rejects_long_frames() {
        let window = AnalysisWindow::blackman(4);
        let mut out = [0.0f32; 4];
        window.apply(&[0.0; 5], &mut out);
    }
}
