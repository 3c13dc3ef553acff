//! Pixform Render: runs channel formulas over images.
//!
//! Images are held as interleaved 8-bit buffers ([`SourceImage`]). An
//! [`ImageSampler`] answers the channel accessors of a formula, and the
//! [`Renderer`] drives the per-pixel, per-channel loop for full renders and
//! scaled previews.

pub mod config;
pub mod error;
pub mod raster;
pub mod renderer;
pub mod sampler;

// Re-exports for convenience.
pub use config::RenderConfig;
pub use error::RenderError;
pub use raster::{PixelLayout, SourceImage, load_image, save_image};
pub use renderer::Renderer;
pub use sampler::ImageSampler;
