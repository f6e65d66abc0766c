//! # Spectrogram Widget
//!
//! Shows the RGBA frame produced by the core renderer as an image, stretched
//! to fill its panel. The widget doubles as the [`DisplaySink`] the
//! application presents finished frames to.

use iced::widget::image::{FilterMethod, Handle};
use iced::widget::{container, image, text};
use iced::{ContentFit, Element, Length};
use spectra_core::{DisplaySink, PixelBuffer};

/// Holds the most recently presented frame as an image handle.
#[derive(Debug, Clone)]
pub struct SpectrogramSink {
    width: usize,
    height: usize,
    handle: Option<Handle>,
}

impl SpectrogramSink {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            handle: None,
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    pub fn clear(&mut self) {
        self.handle = None;
    }

    pub fn handle(&self) -> Option<&Handle> {
        self.handle.as_ref()
    }
}

impl DisplaySink for SpectrogramSink {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: PixelBuffer) {
        let (width, height) = (frame.width() as u32, frame.height() as u32);
        self.handle = Some(Handle::from_rgba(width, height, frame.into_bytes()));
    }
}

/// Spectrogram panel content.
pub struct Spectrogram {
    handle: Option<Handle>,
}

impl Spectrogram {
    pub fn new(handle: Option<Handle>) -> Self {
        Self { handle }
    }

    pub fn view(self) -> Element<'static, crate::Message> {
        match self.handle {
            Some(handle) => image(handle)
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(ContentFit::Fill)
                .filter_method(FilterMethod::Nearest)
                .into(),
            None => container(text("Record or generate a signal to see its spectrogram").size(16))
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .into(),
        }
    }
}
