//! # UI Module
//!
//! Layout and controls for the spectrogram viewer.

pub mod main_display;
