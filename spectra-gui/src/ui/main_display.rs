//! # Main Display Module
//!
//! This module contains the main display components and layout logic
//! for the spectrogram viewer.

use iced::widget::image::Handle;
use iced::widget::{Space, button, column, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length};
use spectra_core::FrequencyScale;
use spectra_core::signal::UtilitySignal;

use crate::widgets::spectrogram;
use crate::{AppDisplayData, Message, Source};

/// Configuration for a single button in the settings sidebar
#[derive(Debug, Clone)]
struct ButtonConfig {
    label: &'static str,
    message: Message,
    button_type: ButtonType,
}

#[derive(Debug, Clone)]
enum ButtonType {
    Standard,
    /// Turns red while recording; disabled without a microphone.
    Recording,
}

const SETTINGS_CONFIG: &[(&str, &[ButtonConfig])] = &[
    ("Input", &[
        ButtonConfig { label: "Record", message: Message::ToggleRecording, button_type: ButtonType::Recording },
        ButtonConfig { label: "Clear", message: Message::ClearRecording, button_type: ButtonType::Standard },
    ]),
    ("Test signals", &[
        ButtonConfig { label: "Uniform noise", message: Message::Generate(UtilitySignal::Uniform), button_type: ButtonType::Standard },
        ButtonConfig { label: "Gaussian noise", message: Message::Generate(UtilitySignal::Gaussian), button_type: ButtonType::Standard },
        ButtonConfig { label: "Pink noise", message: Message::Generate(UtilitySignal::Pink), button_type: ButtonType::Standard },
        ButtonConfig { label: "Impulse", message: Message::Generate(UtilitySignal::Impulse), button_type: ButtonType::Standard },
        ButtonConfig { label: "Sine 440 Hz", message: Message::GenerateTone, button_type: ButtonType::Standard },
    ]),
    ("Analysis", &[
        ButtonConfig { label: "Frequency axis", message: Message::ToggleScale, button_type: ButtonType::Standard },
        ButtonConfig { label: "FFT size", message: Message::CycleFftSize, button_type: ButtonType::Standard },
    ]),
    ("Program", &[
        ButtonConfig { label: "Save Options", message: Message::SaveOptions, button_type: ButtonType::Standard },
        ButtonConfig { label: "Load Options", message: Message::LoadOptions, button_type: ButtonType::Standard },
        ButtonConfig { label: "Exit", message: Message::Exit, button_type: ButtonType::Standard },
    ]),
];

/// Creates the complete main application view
pub fn create_main_view(data: &AppDisplayData, frame: Option<Handle>) -> Element<'static, Message> {
    let title = text("Spectra").size(28);

    let spectrogram_panel = container(
        column![
            text("Spectrogram").size(18),
            Space::with_height(10),
            spectrogram::Spectrogram::new(frame).view(),
        ]
        .spacing(5)
        .padding(15),
    )
    .width(Length::Fill)
    .height(Length::Fill);

    let main_content = row![
        column![
            title,
            Space::with_height(20),
            spectrogram_panel,
            create_status_panel(data),
        ]
        .width(Length::Fill)
        .spacing(10),
        Space::with_width(10),
        create_sidebar(data),
    ]
    .align_y(Alignment::Start)
    .padding(20);

    container(main_content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

/// Source, analysis settings and the dominant note of the signal on screen.
fn create_status_panel(data: &AppDisplayData) -> Element<'static, Message> {
    let source = match &data.source {
        Source::Empty => "No signal".to_string(),
        Source::Microphone if data.recording => "Microphone (recording)".to_string(),
        Source::Microphone => "Microphone (paused)".to_string(),
        Source::Generated(name) => name.clone(),
    };
    let scale = match data.options.frequency_scale {
        FrequencyScale::Logarithmic => "log",
        FrequencyScale::Linear => "linear",
    };
    let settings = format!(
        "FFT {} · {} axis · {} Hz · {:.2} s · {} hops",
        data.options.fft_size, scale, data.sample_rate, data.duration_secs, data.hops
    );
    let dominant = match &data.dominant {
        Some((name, frequency, cents)) => format!("{name} {cents:+.0}¢  ({frequency:.1} Hz)"),
        None => "--".to_string(),
    };

    let mut content = column![
        row![
            text(source).size(16),
            horizontal_space(),
            text("Dominant").size(14),
        ],
        row![text(settings).size(14), horizontal_space(), text(dominant).size(22)]
            .align_y(Alignment::Center),
    ]
    .spacing(5);

    if let Some(status) = &data.status {
        content = content.push(text(status.clone()).size(12));
    }

    container(content.padding(15))
        .width(Length::Fill)
        .height(Length::Shrink)
        .into()
}

/// Creates the settings sidebar widget.
fn create_sidebar(data: &AppDisplayData) -> Element<'static, Message> {
    let mut sections = column![].spacing(10);
    for (title, buttons) in SETTINGS_CONFIG {
        sections = sections.push(make_settings_section(title, buttons, data));
    }

    container(sections.padding(15))
        .width(Length::Fixed(250.0))
        .height(Length::Fill)
        .into()
}

fn make_button(config: &ButtonConfig, data: &AppDisplayData) -> Element<'static, Message> {
    let mut button = button(text(config.label).size(14).width(Length::Fill)).padding([6, 10]);

    match config.button_type {
        ButtonType::Standard => {}
        ButtonType::Recording => {
            if !data.audio_available {
                return button
                    .style(|_theme, _status| {
                        use iced::widget::button;
                        button::Style {
                            background: Some(iced::Background::Color(iced::Color::from_rgb(0.3, 0.3, 0.3))),
                            text_color: iced::Color::from_rgb(0.6, 0.6, 0.6),
                            ..button::Style::default()
                        }
                    })
                    .into();
            }
            if data.recording {
                button = button.style(|_theme, _status| {
                    use iced::widget::button;
                    button::Style {
                        background: Some(iced::Background::Color(iced::Color::from_rgb(0.8, 0.2, 0.2))),
                        text_color: iced::Color::WHITE,
                        ..button::Style::default()
                    }
                });
            }
        }
    }

    button.on_press(config.message.clone()).into()
}

fn make_settings_section(
    title: &'static str,
    buttons: &[ButtonConfig],
    data: &AppDisplayData,
) -> Element<'static, Message> {
    let items_widget = buttons
        .iter()
        .fold(column![].spacing(8), |col, config| col.push(make_button(config, data)));

    column![text(title).size(18), Space::with_height(10), items_widget]
        .spacing(5)
        .into()
}
