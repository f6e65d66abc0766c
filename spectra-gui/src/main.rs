//! # Spectra - Spectrogram Viewer GUI
//!
//! Records microphone audio (or synthesises a test signal), runs it through a
//! `spectra-core` spectrogram session and shows the resulting image.
//!
//! ## Architecture
//! - **Main Thread**: Iced GUI application with dark theme
//! - **Audio Thread**: Owns the input stream and forwards mono chunks
//! - **Communication**: Crossbeam channels for thread-safe data exchange
//! - **Updates**: 60 FPS polling via a timer subscription; the spectrogram is
//!   only recomputed when new audio has arrived

mod telemetry;
mod ui;
mod widgets;

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use iced::{Element, Subscription, Task, Theme};
use spectra_core::audio::{self, Recording};
use spectra_core::music_math::{bin_frequency, cents_deviation, find_nearest_note};
use spectra_core::options::{self, SpectrogramOptions};
use spectra_core::signal::{self, UtilitySignal};
use spectra_core::{FrequencyScale, Spectrogram};
use tracing::{error, info, warn};

use ui::main_display::create_main_view;
use widgets::spectrogram::SpectrogramSink;

const OPTIONS_PATH: &str = "spectra_options.json";
/// Sample rate assumed for generated signals and before the device reports one.
const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Seconds of audio kept in the rolling recording.
const RECORDING_SECONDS: usize = 5;
/// Length of generated test signals in seconds.
const GENERATED_SECONDS: usize = 2;
const FFT_SIZES: [usize; 4] = [512, 1024, 2048, 4096];

pub fn main() -> iced::Result {
    telemetry::init();
    info!("starting spectra");
    iced::application("Spectra", SpectraApp::update, SpectraApp::view)
        .subscription(SpectraApp::subscription)
        .theme(SpectraApp::theme)
        .run_with(SpectraApp::new)
}

#[derive(Debug, Clone)]
pub enum Message {
    // Input sources
    ToggleRecording,
    ClearRecording,
    Generate(UtilitySignal),
    GenerateTone,

    // Analysis settings
    ToggleScale,
    CycleFftSize,

    // Options file
    SaveOptions,
    LoadOptions,

    Exit,

    /// Timer tick for polling the audio thread.
    Tick,
}

/// Where the samples currently on screen came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Empty,
    Microphone,
    Generated(String),
}

/// Everything the view needs, kept apart from the audio plumbing.
#[derive(Debug, Clone)]
pub struct AppDisplayData {
    pub audio_available: bool,
    pub recording: bool,
    pub source: Source,
    pub options: SpectrogramOptions,
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub hops: usize,
    /// Nearest note, bin frequency and its deviation in cents.
    pub dominant: Option<(String, f32, f32)>,
    pub status: Option<String>,
}

impl AppDisplayData {
    /// Forgets the signal on screen. Capture keeps running, so an active
    /// recording starts over instead of leaving the microphone.
    fn clear_signal(&mut self) {
        if !self.recording {
            self.source = Source::Empty;
        }
        self.duration_secs = 0.0;
        self.hops = 0;
        self.dominant = None;
    }
}

enum AudioEvent {
    Started { sample_rate: u32, channels: u16 },
    Chunk(Vec<f32>),
    Failed(String),
}

struct AudioWorker {
    shutdown_tx: Sender<()>,
    /// `true` resumes the input stream, `false` pauses it.
    capture_tx: Sender<bool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl Drop for AudioWorker {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("audio thread panicked during shutdown");
            }
        }
    }
}

struct SpectraApp {
    audio_worker: Option<AudioWorker>,
    audio_receiver: Option<Receiver<AudioEvent>>,
    session: Spectrogram,
    recording: Recording,
    sink: SpectrogramSink,
    dirty: bool,
    display_data: AppDisplayData,
}

impl SpectraApp {
    fn new() -> (Self, Task<Message>) {
        let options = options::load_options_or_default(OPTIONS_PATH).unwrap_or_else(|err| {
            warn!("ignoring options file: {err:#}");
            SpectrogramOptions::default()
        });
        let session = match Spectrogram::new(&options) {
            Ok(session) => session,
            Err(err) => {
                warn!(%err, "options rejected, using defaults");
                Spectrogram::new(&SpectrogramOptions::default())
                    .expect("default options are valid")
            }
        };

        let mut app = Self {
            audio_worker: None,
            audio_receiver: None,
            session,
            recording: Recording::new(DEFAULT_SAMPLE_RATE)
                .with_max_len(DEFAULT_SAMPLE_RATE as usize * RECORDING_SECONDS),
            sink: SpectrogramSink::new(options.display_width, options.display_height),
            dirty: false,
            display_data: AppDisplayData {
                audio_available: true,
                recording: false,
                source: Source::Empty,
                options,
                sample_rate: DEFAULT_SAMPLE_RATE,
                duration_secs: 0.0,
                hops: 0,
                dominant: None,
                status: None,
            },
        };
        app.start_audio_processing();
        (app, Task::none())
    }

    /// Spawns the thread that owns the input stream.
    ///
    /// The stream lives and dies on that thread; the GUI only sees chunks.
    fn start_audio_processing(&mut self) {
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let (capture_tx, capture_rx) = crossbeam_channel::unbounded::<bool>();

        let thread_handle = thread::spawn(move || {
            let (raw_audio_tx, raw_audio_rx) = crossbeam_channel::bounded::<Vec<f32>>(64);
            let capture = match audio::start_audio_capture(raw_audio_tx) {
                Ok(capture) => capture,
                Err(err) => {
                    error!("failed to start audio capture: {err:#}");
                    let _ = event_tx.send(AudioEvent::Failed(format!("{err:#}")));
                    return;
                }
            };
            // Idle until the user starts recording.
            if let Err(err) = capture.pause() {
                warn!("{err:#}");
            }
            let _ = event_tx.send(AudioEvent::Started {
                sample_rate: capture.sample_rate(),
                channels: capture.channels(),
            });

            loop {
                crossbeam_channel::select! {
                    recv(raw_audio_rx) -> msg => match msg {
                        Ok(chunk) => {
                            if event_tx.send(AudioEvent::Chunk(chunk)).is_err() {
                                break;
                            }
                        }
                        Err(_) => {
                            warn!("audio channel closed");
                            break;
                        }
                    },
                    recv(capture_rx) -> msg => match msg {
                        Ok(true) => {
                            if let Err(err) = capture.resume() {
                                warn!("{err:#}");
                            }
                        }
                        Ok(false) => {
                            if let Err(err) = capture.pause() {
                                warn!("{err:#}");
                            }
                        }
                        Err(_) => break,
                    },
                    recv(shutdown_rx) -> _ => break,
                }
            }

            if let Err(err) = capture.pause() {
                warn!("{err:#}");
            }
            info!("audio thread finished");
        });

        self.audio_worker = Some(AudioWorker {
            shutdown_tx,
            capture_tx,
            thread_handle: Some(thread_handle),
        });
        self.audio_receiver = Some(event_rx);
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Exit => {
                self.audio_worker = None;
                self.audio_receiver = None;
                return iced::exit();
            }
            Message::ToggleRecording => {
                let data = &mut self.display_data;
                data.recording = !data.recording && data.audio_available;
                if data.recording {
                    if data.source != Source::Microphone {
                        self.recording.clear();
                        self.sink.clear();
                    }
                    data.source = Source::Microphone;
                    data.dominant = None;
                    data.status = None;
                } else {
                    self.refresh_dominant();
                }
                if let Some(worker) = &self.audio_worker {
                    let _ = worker.capture_tx.send(data.recording);
                }
            }
            Message::ClearRecording => {
                self.recording.clear();
                self.session.clear();
                self.sink.clear();
                self.display_data.clear_signal();
            }
            Message::Generate(kind) => {
                let length = DEFAULT_SAMPLE_RATE as usize * GENERATED_SECONDS;
                let samples = signal::generate(kind, length, &mut rand::rng());
                self.show_generated(kind.to_string(), samples);
            }
            Message::GenerateTone => {
                let length = DEFAULT_SAMPLE_RATE as usize * GENERATED_SECONDS;
                let samples = signal::sine(440.0, DEFAULT_SAMPLE_RATE as f32, length, 0.5);
                self.show_generated("Sine 440 Hz".to_string(), samples);
            }
            Message::ToggleScale => {
                let scale = match self.display_data.options.frequency_scale {
                    FrequencyScale::Logarithmic => FrequencyScale::Linear,
                    FrequencyScale::Linear => FrequencyScale::Logarithmic,
                };
                self.display_data.options.frequency_scale = scale;
                self.session.set_scale(scale);
                self.dirty = true;
            }
            Message::CycleFftSize => {
                let current = self.display_data.options.fft_size;
                let next = FFT_SIZES
                    .iter()
                    .copied()
                    .find(|&size| size > current)
                    .unwrap_or(FFT_SIZES[0]);
                let options = SpectrogramOptions {
                    fft_size: next,
                    ..self.display_data.options.clone()
                };
                self.apply_options(options);
            }
            Message::SaveOptions => {
                match options::save_options(OPTIONS_PATH, &self.display_data.options) {
                    Ok(()) => self.display_data.status = Some(format!("Saved {OPTIONS_PATH}")),
                    Err(err) => {
                        error!("{err:#}");
                        self.display_data.status = Some(format!("{err:#}"));
                    }
                }
            }
            Message::LoadOptions => match options::load_options(OPTIONS_PATH) {
                Ok(options) => {
                    self.apply_options(options);
                    self.display_data.status = Some(format!("Loaded {OPTIONS_PATH}"));
                }
                Err(err) => {
                    error!("{err:#}");
                    self.display_data.status = Some(format!("{err:#}"));
                }
            },
            Message::Tick => {
                self.poll_audio();
                if self.dirty {
                    self.redraw();
                }
            }
        }
        Task::none()
    }

    /// Drains everything the audio thread has sent since the last tick.
    fn poll_audio(&mut self) {
        let Some(receiver) = &self.audio_receiver else {
            return;
        };
        let events: Vec<AudioEvent> = receiver.try_iter().collect();
        for event in events {
            match event {
                AudioEvent::Started { sample_rate, channels } => {
                    info!(sample_rate, channels, "audio capture ready");
                    self.display_data.sample_rate = sample_rate;
                    self.recording = Recording::new(sample_rate)
                        .with_max_len(sample_rate as usize * RECORDING_SECONDS);
                }
                AudioEvent::Chunk(chunk) => {
                    if self.display_data.recording {
                        self.recording.push(&chunk);
                        self.dirty = true;
                    }
                }
                AudioEvent::Failed(reason) => {
                    self.display_data.audio_available = false;
                    self.display_data.recording = false;
                    self.display_data.status = Some(format!("Microphone unavailable: {reason}"));
                    self.audio_worker = None;
                }
            }
        }
        if !self.display_data.audio_available {
            self.audio_receiver = None;
        }
    }

    fn show_generated(&mut self, name: String, samples: Vec<f32>) {
        self.display_data.recording = false;
        self.display_data.source = Source::Generated(name);
        self.display_data.sample_rate = DEFAULT_SAMPLE_RATE;
        self.display_data.duration_secs = samples.len() as f32 / DEFAULT_SAMPLE_RATE as f32;
        self.session.set_mono(samples);
        self.redraw_session();
        self.refresh_dominant();
    }

    /// Rebuilds the session for new options, keeping the current signal.
    fn apply_options(&mut self, options: SpectrogramOptions) {
        match Spectrogram::new(&options) {
            Ok(mut session) => {
                if let Some(samples) = self.session.samples() {
                    session.set_mono(samples.to_vec());
                }
                self.session = session;
                self.sink.resize(options.display_width, options.display_height);
                self.display_data.options = options;
                self.dirty = self.session.samples().is_some();
                if !self.display_data.recording {
                    self.refresh_dominant();
                }
            }
            Err(err) => {
                warn!(%err, "rejected options");
                self.display_data.status = Some(err.to_string());
            }
        }
    }

    fn redraw(&mut self) {
        if self.display_data.source == Source::Microphone {
            self.session.set_mono(self.recording.samples().to_vec());
            self.display_data.duration_secs = self.recording.duration_secs();
        }
        self.redraw_session();
    }

    fn redraw_session(&mut self) {
        self.dirty = false;
        if self.session.samples().is_none() {
            return;
        }
        if let Err(err) = self.session.draw_to(&mut self.sink) {
            warn!(%err, "failed to draw spectrogram");
            return;
        }
        self.display_data.hops = self
            .session
            .samples()
            .map_or(0, |s| self.session.analyzer().number_of_hops(s.len()));
    }

    /// Labels the strongest bin of the signal on screen with its nearest note.
    fn refresh_dominant(&mut self) {
        self.display_data.dominant = self
            .session
            .analyze()
            .ok()
            .and_then(|matrix| matrix.dominant_bin())
            .and_then(|bin| {
                let frequency = bin_frequency(
                    bin,
                    self.display_data.options.fft_size,
                    self.display_data.sample_rate as f32,
                );
                find_nearest_note(frequency).map(|note| {
                    (note.name.clone(), frequency, cents_deviation(frequency, note.frequency))
                })
            });
    }

    fn view(&self) -> Element<'_, Message> {
        create_main_view(&self.display_data, self.sink.handle().cloned())
    }

    fn subscription(&self) -> Subscription<Message> {
        iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick)
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}
