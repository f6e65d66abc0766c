//! # Colour Mapping Module
//!
//! Maps a smoothed magnitude to an opaque RGB colour by feeding it to an HSL
//! conversion as both hue and lightness, with full saturation. Zero is black,
//! one is white, and the values in between sweep through the hue circle.
//!
//! Inputs are not normalised or clamped. Magnitudes above 1 still go through
//! the same formula and saturate per channel, which can give abrupt colours
//! for loud bins.

/// One opaque pixel colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorSample {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl ColorSample {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// RGBA bytes with full opacity.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}

/// Standard HSL to RGB conversion, each channel nominally in `[0, 1]`.
pub fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

/// Rounds a unit channel to a byte, saturating outside `[0, 255]`.
#[inline]
fn to_byte(channel: f32) -> u8 {
    // `as` saturates and maps NaN to 0.
    (channel * 255.0).round() as u8
}

/// Stateless magnitude-to-colour mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorMapper;

impl ColorMapper {
    pub fn map(value: f32) -> ColorSample {
        let [r, g, b] = hsl_to_rgb(value, 1.0, value);
        ColorSample::new(to_byte(r), to_byte(g), to_byte(b))
    }

    /// Writes the colour for `value` as RGBA at pixel index `pixel` of a
    /// packed RGBA buffer.
    ///
    /// # Panics
    /// If the pixel lies outside `pixels`.
    pub fn plot(value: f32, pixels: &mut [u8], pixel: usize) {
        let offset = pixel * 4;
        pixels[offset..offset + 4].copy_from_slice(&Self::map(value).to_rgba());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_black_and_one_is_white() {
        assert_eq!(ColorMapper::map(0.0), ColorSample::new(0, 0, 0));
        assert_eq!(ColorMapper::map(1.0), ColorSample::new(255, 255, 255));
    }

    #[test]
    fn achromatic_shortcut() {
        assert_eq!(hsl_to_rgb(0.3, 0.0, 0.25), [0.25, 0.25, 0.25]);
    }

    #[test]
    fn primary_hues() {
        let red = hsl_to_rgb(0.0, 1.0, 0.5);
        assert!((red[0] - 1.0).abs() < 1e-6 && red[1].abs() < 1e-6 && red[2].abs() < 1e-6);
        let green = hsl_to_rgb(1.0 / 3.0, 1.0, 0.5);
        assert!(green[0].abs() < 1e-6 && (green[1] - 1.0).abs() < 1e-6 && green[2].abs() < 1e-6);
    }

    #[test]
    fn mid_value_is_coloured() {
        let sample = ColorMapper::map(0.5);
        // h = 0.5 is cyan at l = 0.5.
        assert_eq!(sample, ColorSample::new(0, 255, 255));
    }

    #[test]
    fn large_values_saturate_instead_of_wrapping() {
        let sample = ColorMapper::map(2.5);
        assert_eq!(sample, ColorSample::new(255, 255, 255));
        let sample = ColorMapper::map(-0.5);
        assert_eq!(sample, ColorSample::new(0, 0, 0));
    }

    #[test]
    fn plot_writes_opaque_rgba_at_offset() {
        let mut pixels = vec![7u8; 12];
        ColorMapper::plot(1.0, &mut pixels, 1);
        assert_eq!(&pixels[0..4], &[7, 7, 7, 7]);
        assert_eq!(&pixels[4..8], &[255, 255, 255, 255]);
        assert_eq!(&pixels[8..12], &[7, 7, 7, 7]);
    }
}
