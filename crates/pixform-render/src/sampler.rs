//! Channel accessors backed by a [`SourceImage`].

use pixform_core::{Channel, ChannelSource};

use crate::raster::{PixelLayout, SourceImage};

/// Answers `red(x,y)` and friends from an 8-bit image.
///
/// Formula coordinates are divided by the aspect ratio before lookup, so a
/// downsized preview can be sampled with full-size coordinates. The result
/// is truncated toward zero and clamped into the image.
#[derive(Debug, Clone, Copy)]
pub struct ImageSampler<'a> {
    image: &'a SourceImage,
    aspect_x: f64,
    aspect_y: f64,
}

impl<'a> ImageSampler<'a> {
    pub fn new(image: &'a SourceImage) -> Self {
        Self::with_aspect(image, 1.0, 1.0)
    }

    pub fn with_aspect(image: &'a SourceImage, aspect_x: f64, aspect_y: f64) -> Self {
        Self {
            image,
            aspect_x,
            aspect_y,
        }
    }

    fn locate(&self, x: f64, y: f64) -> (u32, u32) {
        // Float to int casts saturate and map NaN to 0.
        let col = ((x / self.aspect_x) as i64).clamp(0, i64::from(self.image.width) - 1);
        let row = ((y / self.aspect_y) as i64).clamp(0, i64::from(self.image.height) - 1);
        (col as u32, row as u32)
    }
}

impl ChannelSource for ImageSampler<'_> {
    fn sample(&self, channel: Channel, x: f64, y: f64) -> f64 {
        if self.image.is_empty() {
            return 0.0;
        }
        let (col, row) = self.locate(x, y);
        let px = self.image.pixel(col, row);

        let value = match (self.image.layout, channel) {
            (PixelLayout::Gray | PixelLayout::GrayAlpha, Channel::Alpha) => {
                px.get(1).copied().unwrap_or(u8::MAX)
            }
            (PixelLayout::Gray | PixelLayout::GrayAlpha, _) => px[0],
            (PixelLayout::Rgb | PixelLayout::Rgba, Channel::Red) => px[0],
            (PixelLayout::Rgb | PixelLayout::Rgba, Channel::Green) => px[1],
            (PixelLayout::Rgb | PixelLayout::Rgba, Channel::Blue) => px[2],
            (PixelLayout::Rgb | PixelLayout::Rgba, Channel::Gray) => {
                let sum = u16::from(px[0]) + u16::from(px[1]) + u16::from(px[2]);
                return f64::from(sum) / 3.0;
            }
            (PixelLayout::Rgb | PixelLayout::Rgba, Channel::Alpha) => {
                px.get(3).copied().unwrap_or(u8::MAX)
            }
        };
        f64::from(value)
    }
}
