//! Transform error definitions.

use image::ImageError;
use thiserror::Error;

use crate::transform::codec::ImageCodec;

/// Errors that can occur while transforming an image.
///
/// None of these reach the client: the proxy falls back to returning the
/// original bytes.
#[derive(Debug, Error)]
pub enum TransformError {
    /// Content type has no decoder.
    #[error("Unsupported content-type: {0}")]
    Unsupported(String),

    /// Image bytes were malformed for the declared codec.
    #[error("Failed to decode {codec} image: {source}")]
    Decode {
        codec: ImageCodec,
        #[source]
        source: ImageError,
    },

    /// Decoded area exceeds the configured pixel limit.
    #[error("Image {width}x{height} exceeds limit of {max_pixels} pixels")]
    TooLarge {
        width: u32,
        height: u32,
        max_pixels: u64,
    },

    /// PNG encoding failed.
    #[error("Failed to encode PNG: {0}")]
    Encode(#[source] ImageError),

    /// The blocking worker running the transform did not complete.
    #[error("Transform task failed: {0}")]
    Task(String),
}

impl TransformError {
    /// Short label used in metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unsupported(_) => "unsupported",
            Self::Decode { .. } => "decode",
            Self::TooLarge { .. } => "too_large",
            Self::Encode(_) => "encode",
            Self::Task(_) => "task",
        }
    }
}
