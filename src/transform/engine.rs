//! Decode → invert → encode pipeline.

use bytes::Bytes;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageReader, RgbaImage};
use std::io::Cursor;

use crate::config::TransformConfig;
use crate::transform::codec::{is_image, ImageCodec, OUTPUT_CONTENT_TYPE};
use crate::transform::error::TransformError;
use crate::transform::invert::invert_channels;

/// Result of routing an upstream body through the engine.
#[derive(Debug)]
pub enum TransformOutcome {
    /// Body was re-encoded; it is always `image/png`.
    Transformed(Bytes),
    /// Original bytes and content type, untouched. `cause` is set when a
    /// transform was attempted and failed.
    PassThrough {
        body: Bytes,
        content_type: Option<String>,
        cause: Option<TransformError>,
    },
}

impl TransformOutcome {
    pub fn content_type(&self) -> Option<&str> {
        match self {
            Self::Transformed(_) => Some(OUTPUT_CONTENT_TYPE),
            Self::PassThrough { content_type, .. } => content_type.as_deref(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Transformed(_) => "transformed",
            Self::PassThrough { cause: Some(_), .. } => "fallback",
            Self::PassThrough { cause: None, .. } => "skipped",
        }
    }
}

/// The image transform engine. Stateless apart from its limits, so it is
/// cheap to copy into blocking workers.
#[derive(Debug, Clone, Copy)]
pub struct ImageTransformer {
    max_pixels: u64,
}

impl ImageTransformer {
    pub fn new(max_pixels: u64) -> Self {
        Self { max_pixels }
    }

    pub fn from_config(config: &TransformConfig) -> Self {
        Self::new(config.max_pixels)
    }

    /// Decode `input` according to `content_type`, invert its colour
    /// channels and return the PNG encoding.
    pub fn transform(&self, content_type: &str, input: &[u8]) -> Result<Vec<u8>, TransformError> {
        let codec = ImageCodec::from_content_type(content_type)
            .ok_or_else(|| TransformError::Unsupported(content_type.to_string()))?;

        let mut raster = self.decode(codec, input)?;
        invert_channels(&mut raster);
        encode_png(&raster)
    }

    /// Run the transform when the body is declared as an image, otherwise
    /// or on failure hand the original body back.
    pub fn process(&self, content_type: Option<&str>, body: Bytes) -> TransformOutcome {
        let Some(ct) = content_type.filter(|ct| is_image(ct)) else {
            return TransformOutcome::PassThrough {
                body,
                content_type: content_type.map(str::to_string),
                cause: None,
            };
        };

        match self.transform(ct, &body) {
            Ok(png) => TransformOutcome::Transformed(Bytes::from(png)),
            Err(e) => TransformOutcome::PassThrough {
                body,
                content_type: Some(ct.to_string()),
                cause: Some(e),
            },
        }
    }

    // Paletted, greyscale and 16-bit sources all come out as 8-bit RGBA of
    // the same dimensions.
    fn decode(&self, codec: ImageCodec, input: &[u8]) -> Result<RgbaImage, TransformError> {
        let decode_err = |source| TransformError::Decode { codec, source };

        let decoder = ImageReader::with_format(Cursor::new(input), codec.format())
            .into_decoder()
            .map_err(decode_err)?;

        let (width, height) = decoder.dimensions();
        if u64::from(width) * u64::from(height) > self.max_pixels {
            return Err(TransformError::TooLarge {
                width,
                height,
                max_pixels: self.max_pixels,
            });
        }

        let image = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        Ok(image.into_rgba8())
    }
}

impl Default for ImageTransformer {
    fn default() -> Self {
        Self::from_config(&TransformConfig::default())
    }
}

fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, TransformError> {
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            raster.as_raw(),
            raster.width(),
            raster.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(TransformError::Encode)?;
    Ok(out)
}
