//! Content-type driven codec selection.
//!
//! Only the media types listed in [`ImageCodec`] are decoded. Everything else,
//! including other `image/*` subtypes, is rejected before any bytes are read.

use image::ImageFormat;
use std::fmt;

/// Media type of every transformed response.
pub const OUTPUT_CONTENT_TYPE: &str = "image/png";

/// Decoders the transform engine is able to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageCodec {
    Gif,
    Jpeg,
    Png,
}

impl ImageCodec {
    /// Map a `Content-Type` header value to a codec.
    ///
    /// Parameters (`; charset=...`) and case are ignored; the media type
    /// itself must match exactly.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "image/gif" => Some(Self::Gif),
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn format(self) -> ImageFormat {
        match self {
            Self::Gif => ImageFormat::Gif,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Gif => "image/gif",
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

impl fmt::Display for ImageCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// True for any `image/*` media type, supported or not.
pub fn is_image(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}
