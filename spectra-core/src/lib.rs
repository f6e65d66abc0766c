// spectra-core/src/lib.rs

//! The core logic for the spectrogram viewer.
//! This crate is responsible for the radix-2 FFT, short-time analysis,
//! colour mapping and pixel composition. It is completely headless
//! and contains no GUI code; a caller hands it mono samples and gets an
//! RGBA image back.

pub mod audio;
pub mod color;
pub mod error;
pub mod fft;
pub mod music_math;
pub mod options;
pub mod render;
pub mod signal;
pub mod spectrogram;
pub mod stft;
pub mod window;

pub use color::{ColorMapper, ColorSample};
pub use error::{Result, SpectraError};
pub use fft::{ComplexBuffer, FftEngine, TwiddleTable};
pub use options::SpectrogramOptions;
pub use render::{DisplaySink, FrequencyScale, PixelBuffer, SpectrogramRenderer};
pub use spectrogram::{downmix, Spectrogram};
pub use stft::{MagnitudeMatrix, StftAnalyzer};
pub use window::AnalysisWindow;
