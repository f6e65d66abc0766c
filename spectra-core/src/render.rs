//! # Spectrogram Rendering Module
//!
//! Turns a [`MagnitudeMatrix`] into pixels in two passes:
//!
//! 1. **Offscreen**: one pixel per `(hop, bin)` cell, `num_hops` wide and
//!    `N/2` tall, coloured by [`ColorMapper`].
//! 2. **Compose**: every offscreen row is stretched across the destination
//!    width and blitted onto a horizontal band of the destination, with bin 0
//!    at the bottom. On the logarithmic axis low bins get taller bands than
//!    high bins.
//!
//! The destination itself is opaque to this crate: a [`DisplaySink`] only has
//! to report its size and accept a finished [`PixelBuffer`].

use serde::{Deserialize, Serialize};

use crate::color::ColorMapper;
use crate::error::{Result, SpectraError};
use crate::stft::MagnitudeMatrix;

/// Largest accepted display width or height, in pixels.
pub const MAX_DISPLAY_DIMENSION: usize = 16_384;

/// Byte length of a `width` by `height` RGBA image, `None` on overflow.
fn byte_len(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height)?.checked_mul(4)
}

/// Rejects empty displays and ones too large to allocate a frame for.
pub fn validate_display_size(width: usize, height: usize) -> Result<()> {
    let in_range = |side: usize| (1..=MAX_DISPLAY_DIMENSION).contains(&side);
    if !in_range(width) || !in_range(height) || byte_len(width, height).is_none() {
        return Err(SpectraError::InvalidDisplaySize { width, height });
    }
    Ok(())
}

/// A packed RGBA image, row-major from the top-left corner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// A transparent black image.
    ///
    /// # Panics
    /// If the byte length overflows `usize`.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; Self::checked_len(width, height)],
        }
    }

    /// An image filled with one RGBA colour.
    ///
    /// # Panics
    /// If the byte length overflows `usize`.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(Self::checked_len(width, height));
        for _ in 0..width * height {
            data.extend_from_slice(&rgba);
        }
        Self { width, height, data }
    }

    fn checked_len(width: usize, height: usize) -> usize {
        byte_len(width, height)
            .unwrap_or_else(|| panic!("{width}x{height} pixel buffer overflows usize"))
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    pub fn pixel_index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let offset = self.pixel_index(x, y) * 4;
        [
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
            self.data[offset + 3],
        ]
    }

    fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width * 4;
        &self.data[start..start + self.width * 4]
    }
}

/// Receives finished frames. Implemented by whatever presents pixels.
pub trait DisplaySink {
    /// Destination size in pixels as `(width, height)`.
    fn size(&self) -> (usize, usize);

    fn present(&mut self, frame: PixelBuffer);
}

/// Affine map from one interval onto another; used for the horizontal stretch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearMapper {
    domain: (f64, f64),
    range: (f64, f64),
    coefficient: f64,
}

impl LinearMapper {
    /// # Panics
    /// If the domain is degenerate (`domain.0 == domain.1`).
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        assert!(domain.0 != domain.1, "linear mapper domain must not be empty");
        Self {
            domain,
            range,
            coefficient: (range.1 - range.0) / (domain.1 - domain.0),
        }
    }

    #[inline]
    pub fn map(&self, value: f64) -> f64 {
        self.range.0 + (value - self.domain.0) * self.coefficient
    }
}

/// Vertical layout of the frequency bins on the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyScale {
    /// Band heights follow `log2(bin)`, giving low frequencies more room.
    #[default]
    Logarithmic,
    /// Every bin gets an equal share of the height.
    Linear,
}

/// One source row drawn over destination rows `[start, end)`, counted from
/// the bottom of the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub source_row: usize,
    pub start: usize,
    pub end: usize,
}

/// Upper edge of the band for row `y` on the logarithmic axis:
/// `floor(height · log2(y) / log2(num_bins − 1))`.
///
/// With only two bins the axis collapses; the single drawable row then fills
/// the whole height.
pub fn log_row(y: usize, num_bins: usize, height: usize) -> usize {
    let top = num_bins.saturating_sub(1);
    if top <= 1 {
        return height;
    }
    let ratio = (y as f64).log2() / (top as f64).log2();
    (height as f64 * ratio).floor() as usize
}

/// Composes matrices into display-sized frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrogramRenderer {
    width: usize,
    height: usize,
    scale: FrequencyScale,
}

impl SpectrogramRenderer {
    /// # Errors
    /// [`SpectraError::InvalidDisplaySize`] unless both sides lie in
    /// `1..=MAX_DISPLAY_DIMENSION`.
    pub fn new(width: usize, height: usize, scale: FrequencyScale) -> Result<Self> {
        validate_display_size(width, height)?;
        Ok(Self { width, height, scale })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn scale(&self) -> FrequencyScale {
        self.scale
    }

    pub fn set_scale(&mut self, scale: FrequencyScale) {
        self.scale = scale;
    }

    /// One pixel per cell: x is the hop, y is the bin.
    pub fn render_offscreen(matrix: &MagnitudeMatrix) -> PixelBuffer {
        let mut image = PixelBuffer::new(matrix.num_hops(), matrix.num_bins());
        for (hop, bins) in matrix.hops().enumerate() {
            for (bin, &value) in bins.iter().enumerate() {
                let pixel = image.pixel_index(hop, bin);
                ColorMapper::plot(value, image.as_bytes_mut(), pixel);
            }
        }
        image
    }

    /// Destination bands for `num_bins` offscreen rows.
    ///
    /// Bands are contiguous, start at row 0 and end exactly at the display
    /// height; some may be empty.
    pub fn bands(&self, num_bins: usize) -> Vec<Band> {
        match self.scale {
            FrequencyScale::Logarithmic => {
                // log2(0) is undefined, so the scan starts at 1 and row y
                // paints the source row just below it.
                let mut bands = Vec::with_capacity(num_bins.saturating_sub(1));
                let mut last_y = 0;
                for y in 1..num_bins {
                    let log_y = log_row(y, num_bins, self.height).max(last_y);
                    bands.push(Band {
                        source_row: y - 1,
                        start: last_y,
                        end: log_y,
                    });
                    last_y = log_y;
                }
                bands
            }
            FrequencyScale::Linear => (0..num_bins)
                .map(|bin| Band {
                    source_row: bin,
                    start: bin * self.height / num_bins,
                    end: (bin + 1) * self.height / num_bins,
                })
                .collect(),
        }
    }

    /// Stretches the offscreen image onto a white destination.
    pub fn compose(&self, offscreen: &PixelBuffer) -> PixelBuffer {
        let mut frame = PixelBuffer::filled(self.width, self.height, [255, 255, 255, 255]);
        if offscreen.is_empty() {
            return frame;
        }

        // Nearest source column for every destination column.
        let stretch = LinearMapper::new((0.0, self.width as f64), (0.0, offscreen.width() as f64));
        let columns: Vec<usize> = (0..self.width)
            .map(|x| (stretch.map(x as f64).floor() as usize).min(offscreen.width() - 1))
            .collect();

        let mut stretched = vec![0u8; self.width * 4];
        for band in self.bands(offscreen.height()) {
            if band.start >= band.end {
                continue;
            }
            let source = offscreen.row(band.source_row);
            for (x, &column) in columns.iter().enumerate() {
                stretched[x * 4..x * 4 + 4].copy_from_slice(&source[column * 4..column * 4 + 4]);
            }
            // Flip vertically: band rows count up from the bottom edge.
            for row in band.start..band.end.min(self.height) {
                let y = self.height - 1 - row;
                let start = y * self.width * 4;
                frame.data[start..start + self.width * 4].copy_from_slice(&stretched);
            }
        }
        frame
    }

    /// Offscreen pass followed by the compose pass.
    pub fn render(&self, matrix: &MagnitudeMatrix) -> PixelBuffer {
        self.compose(&Self::render_offscreen(matrix))
    }
}
