//! # Widgets Module
//!
//! Custom display widgets for the spectrogram viewer.

pub mod spectrogram;
