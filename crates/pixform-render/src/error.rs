use pixform_core::{Channel, ParseError};

/// Errors that can occur while loading, configuring or rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{channel} formula: {source}")]
    Compile {
        channel: Channel,
        #[source]
        source: ParseError,
    },
    #[error("failed to decode image: {0}")]
    Decode(image::ImageError),
    #[error("failed to encode image: {0}")]
    Encode(image::ImageError),
    #[error("pixel buffer holds {found} bytes, expected {expected}")]
    BufferSize { expected: usize, found: usize },
    #[error("preview size must be non-zero, got {width}x{height}")]
    EmptyPreview { width: u32, height: u32 },
    #[error("invalid render config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
