//! # Music Math Module
//!
//! Pitch and level conversions, plus an equal-temperament note table used to
//! label frequencies picked out of a spectrogram.
//!
//! The decibel helpers follow the PureData convention: levels are offset by
//! 100 dB so that unity power or RMS reads as 100 and silence reads as 0.

use once_cell::sync::Lazy;

/// Reference tuning for A4.
pub const A4_FREQUENCY: f32 = 440.0;

const MIDI_A4: f32 = 69.0;
const MIDI_FLOOR: f32 = -1500.0;

/// A named pitch with its equal-temperament frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name such as "A4" or "C#3".
    pub name: String,
    pub frequency: f32,
}

/// The 88 keys of a standard piano, A0 to C8.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];
    (0..88)
        .map(|key| {
            // Key 48 is A4; octave numbers change at C.
            let frequency = A4_FREQUENCY * 2.0_f32.powf((key as f32 - 48.0) / 12.0);
            let name = format!("{}{}", NOTE_NAMES[key % 12], (key + 9) / 12);
            Note { name, frequency }
        })
        .collect()
});

/// All 88 notes, lowest first.
pub fn notes() -> &'static [Note] {
    &NOTES
}

/// The piano key closest to `freq`, or `None` for a non-positive or
/// non-finite frequency.
pub fn find_nearest_note(freq: f32) -> Option<&'static Note> {
    if !(freq.is_finite() && freq > 0.0) {
        return None;
    }
    NOTES
        .iter()
        .min_by(|a, b| (a.frequency - freq).abs().total_cmp(&(b.frequency - freq).abs()))
}

/// Deviation of `freq` from `target` in cents; positive is sharp.
pub fn cents_deviation(freq: f32, target: f32) -> f32 {
    1200.0 * (freq / target).log2()
}

/// Centre frequency of `bin` for a transform of `fft_size` samples.
pub fn bin_frequency(bin: usize, fft_size: usize, sample_rate: f32) -> f32 {
    bin as f32 * sample_rate / fft_size as f32
}

pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

/// MIDI pitch to frequency. The pitch is floored first.
pub fn mtof(midi: f32) -> f32 {
    if midi <= MIDI_FLOOR {
        return 0.0;
    }
    if midi > 1499.0 {
        return 3.282_417_6e38;
    }
    A4_FREQUENCY * 2.0_f32.powf((midi.floor() - MIDI_A4) / 12.0)
}

/// Frequency to a floored MIDI pitch; non-positive input gives -1500.
pub fn ftom(freq: f32) -> f32 {
    let midi = if freq > 0.0 {
        (freq / A4_FREQUENCY).log2() * 12.0 + MIDI_A4
    } else {
        MIDI_FLOOR
    };
    midi.floor()
}

pub fn powtodb(power: f32) -> f32 {
    if power <= 0.0 {
        return 0.0;
    }
    (100.0 + 10.0 * power.log10()).max(0.0)
}

pub fn dbtopow(db: f32) -> f32 {
    if db <= 0.0 {
        return 0.0;
    }
    10.0_f32.powf(0.1 * (db.min(870.0) - 100.0))
}

pub fn rmstodb(rms: f32) -> f32 {
    if rms <= 0.0 {
        return 0.0;
    }
    (100.0 + 20.0 * rms.log10()).max(0.0)
}

pub fn dbtorms(db: f32) -> f32 {
    if db <= 0.0 {
        return 0.0;
    }
    10.0_f32.powf(0.05 * (db.min(485.0) - 100.0))
}

/// Linear amplitude to dBFS, floored at -100 dB.
pub fn lintodb(lin: f32) -> f32 {
    20.0 * if lin > 0.00001 { lin.log10() } else { -5.0 }
}

pub fn dbtolin(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub fn veltoamp(velocity: f32) -> f32 {
    velocity / 127.0
}
