//! 8-bit interleaved image buffers and conversion to and from the `image` crate.

use std::fmt;
use std::path::Path;

use image::imageops::FilterType;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use pixform_core::Channel;
use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Channel layout of an interleaved 8-bit buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl PixelLayout {
    /// Bytes per pixel.
    pub const fn channel_count(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::GrayAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::GrayAlpha | Self::Rgba)
    }

    pub const fn is_gray(self) -> bool {
        matches!(self, Self::Gray | Self::GrayAlpha)
    }

    /// Formula channels rendered for this layout, in byte order.
    pub const fn channels(self) -> &'static [Channel] {
        match self {
            Self::Gray => &[Channel::Gray],
            Self::GrayAlpha => &[Channel::Gray, Channel::Alpha],
            Self::Rgb => &[Channel::Red, Channel::Green, Channel::Blue],
            Self::Rgba => &[Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha],
        }
    }
}

impl fmt::Display for PixelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gray => write!(f, "gray"),
            Self::GrayAlpha => write!(f, "gray+alpha"),
            Self::Rgb => write!(f, "RGB"),
            Self::Rgba => write!(f, "RGBA"),
        }
    }
}

/// An 8-bit image, rows top to bottom, channels interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl SourceImage {
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
    ) -> Result<Self, RenderError> {
        let expected = buffer_len(width, height, layout);
        if data.len() != expected {
            return Err(RenderError::BufferSize {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    /// A zero-filled image.
    pub fn blank(width: u32, height: u32, layout: PixelLayout) -> Self {
        Self {
            width,
            height,
            layout,
            data: vec![0; buffer_len(width, height, layout)],
        }
    }

    /// Convert any decoded image, keeping gray/colour and alpha but
    /// reducing the depth to 8 bits.
    pub fn from_dynamic(img: &DynamicImage) -> Self {
        let color = img.color();
        let (layout, data) = match (color.has_color(), color.has_alpha()) {
            (false, false) => (PixelLayout::Gray, img.to_luma8().into_raw()),
            (false, true) => (PixelLayout::GrayAlpha, img.to_luma_alpha8().into_raw()),
            (true, false) => (PixelLayout::Rgb, img.to_rgb8().into_raw()),
            (true, true) => (PixelLayout::Rgba, img.to_rgba8().into_raw()),
        };
        Self {
            width: img.width(),
            height: img.height(),
            layout,
            data,
        }
    }

    pub fn to_dynamic(&self) -> Result<DynamicImage, RenderError> {
        let (w, h) = (self.width, self.height);
        let data = self.data.clone();
        let img = match self.layout {
            PixelLayout::Gray => GrayImage::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
            PixelLayout::GrayAlpha => {
                GrayAlphaImage::from_raw(w, h, data).map(DynamicImage::ImageLumaA8)
            }
            PixelLayout::Rgb => RgbImage::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
            PixelLayout::Rgba => RgbaImage::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        };
        img.ok_or(RenderError::BufferSize {
            expected: buffer_len(w, h, self.layout),
            found: self.data.len(),
        })
    }

    /// Resample to exactly `width` x `height`, keeping the layout.
    pub fn resized(&self, width: u32, height: u32) -> Result<Self, RenderError> {
        let resized = self
            .to_dynamic()?
            .resize_exact(width, height, FilterType::Triangle);
        Ok(Self::from_dynamic(&resized))
    }

    /// Bytes of one row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.layout.channel_count()
    }

    /// Channel bytes of the pixel at (`x`, `y`). Panics when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let n = self.layout.channel_count();
        let start = y as usize * self.stride() + x as usize * n;
        &self.data[start..start + n]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

fn buffer_len(width: u32, height: u32, layout: PixelLayout) -> usize {
    width as usize * height as usize * layout.channel_count()
}

/// Load an image from disk.
///
/// Supports the formats enabled in the `image` crate (PNG, JPEG, TIFF, ...).
/// Higher bit depths are reduced to 8 bits.
pub fn load_image(path: &Path) -> Result<SourceImage, RenderError> {
    let img = image::open(path).map_err(RenderError::Decode)?;
    let source = SourceImage::from_dynamic(&img);
    tracing::debug!(
        "Loaded {}: {}x{} {}",
        path.display(),
        source.width,
        source.height,
        source.layout
    );
    Ok(source)
}

/// Save an image; the format follows the file extension.
pub fn save_image(image: &SourceImage, path: &Path) -> Result<(), RenderError> {
    image
        .to_dynamic()?
        .save(path)
        .map_err(RenderError::Encode)
}
