//! # Error Module
//!
//! Errors surfaced by the spectrogram core. Construction and configuration
//! problems are reported through [`SpectraError`]; buffer-length contract
//! violations on the transform entry points panic instead, since they can
//! only come from a programming mistake.

/// Errors returned by the spectrogram core.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SpectraError {
    #[error("order must be greater than 1: {0}")]
    InvalidOrder(u32),

    #[error("order {0} exceeds the addressable transform length")]
    OrderTooLarge(u32),

    #[error("frame size must be a power of two of at least 4 samples: {0}")]
    InvalidFrameSize(usize),

    #[error("smoothing coefficient must lie in (0, 1]: {0}")]
    InvalidSmoothing(f32),

    #[error("display size {width}x{height} is out of range")]
    InvalidDisplaySize { width: usize, height: usize },

    #[error("cannot downmix zero channels")]
    NoChannels,

    #[error("channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },

    #[error("no channel data has been set")]
    MissingChannelData,
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, SpectraError>`.
pub type Result<T> = std::result::Result<T, SpectraError>;
