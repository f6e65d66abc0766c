//! End-to-end spectrogram sessions: signal in, pixels out.

use rand::rngs::StdRng;
use rand::SeedableRng;
use spectra_core::music_math::{bin_frequency, find_nearest_note};
use spectra_core::options::{load_options, save_options};
use spectra_core::signal::{self, UtilitySignal};
use spectra_core::{DisplaySink, FrequencyScale, PixelBuffer, Spectrogram, SpectrogramOptions};

const SAMPLE_RATE: f32 = 44_100.0;

#[derive(Default)]
struct Screen {
    width: usize,
    height: usize,
    last: Option<PixelBuffer>,
}

impl DisplaySink for Screen {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: PixelBuffer) {
        self.last = Some(frame);
    }
}

#[test]
fn tone_is_found_in_the_expected_bin() {
    let options = SpectrogramOptions::default();
    let mut session = Spectrogram::new(&options).unwrap();
    session.set_mono(signal::sine(440.0, SAMPLE_RATE, 44_100, 0.5));

    let matrix = session.analyze().unwrap();
    assert_eq!(matrix.num_hops(), 86);
    assert_eq!(matrix.num_bins(), 512);

    let bin = matrix.dominant_bin().unwrap();
    assert_eq!(bin, 10);
    let note = find_nearest_note(bin_frequency(bin, options.fft_size, SAMPLE_RATE)).unwrap();
    assert_eq!(note.name, "A4");
}

#[test]
fn cancelling_channels_draw_black() {
    let options = SpectrogramOptions {
        fft_size: 256,
        display_width: 64,
        display_height: 48,
        ..Default::default()
    };
    let mut session = Spectrogram::new(&options).unwrap();
    let left = signal::sine(1_000.0, SAMPLE_RATE, 4_096, 0.8);
    let right: Vec<f32> = left.iter().map(|s| -s).collect();
    session.set_channels(&[&left, &right]).unwrap();

    let frame = session.draw().unwrap();
    assert_eq!((frame.width(), frame.height()), (64, 48));
    assert!(frame.as_bytes().chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
}

#[test]
fn noise_covers_the_whole_display() {
    let mut rng = StdRng::seed_from_u64(5);
    // Quiet enough that no cell reaches the white end of the colour map.
    let noise: Vec<f32> = signal::generate(UtilitySignal::Pink, 16_384, &mut rng)
        .into_iter()
        .map(|s| s * 0.05)
        .collect();
    for scale in [FrequencyScale::Logarithmic, FrequencyScale::Linear] {
        let options = SpectrogramOptions {
            fft_size: 512,
            frequency_scale: scale,
            ..Default::default()
        };
        let mut session = Spectrogram::new(&options).unwrap();
        session.set_mono(noise.clone());
        let mut screen = Screen {
            width: 200,
            height: 150,
            last: None,
        };
        session.draw_to(&mut screen).unwrap();

        let frame = screen.last.expect("a frame was presented");
        assert_eq!((frame.width(), frame.height()), (200, 150));
        assert!(frame.as_bytes().chunks_exact(4).all(|p| p[3] == 255));
        // A white background row would mean a band was skipped.
        for y in 0..frame.height() {
            let row_is_white = (0..frame.width()).all(|x| frame.pixel(x, y) == [255, 255, 255, 255]);
            assert!(!row_is_white, "row {y} left unpainted for {scale:?}");
        }
    }
}

#[test]
fn short_recording_draws_background_only() {
    let mut session = Spectrogram::new(&SpectrogramOptions::default()).unwrap();
    session.set_mono(vec![0.3; 500]);
    assert!(session.analyze().unwrap().is_empty());
    let frame = session.draw().unwrap();
    assert!(frame.as_bytes().iter().all(|&b| b == 255));
}

#[test]
fn session_from_saved_options() {
    let path = std::env::temp_dir().join(format!("spectra-session-{}.json", std::process::id()));
    let options = SpectrogramOptions {
        fft_size: 128,
        smoothing_coefficient: 1.0,
        frequency_scale: FrequencyScale::Linear,
        display_width: 32,
        display_height: 16,
    };
    save_options(&path, &options).unwrap();
    let loaded = load_options(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let mut session = Spectrogram::new(&loaded).unwrap();
    let mut rng = StdRng::seed_from_u64(8);
    session.set_mono(signal::generate(UtilitySignal::Gaussian, 1_024, &mut rng));
    let offscreen = session.render_offscreen().unwrap();
    assert_eq!((offscreen.width(), offscreen.height()), (16, 64));
    let frame = session.draw().unwrap();
    assert_eq!((frame.width(), frame.height()), (32, 16));
}
