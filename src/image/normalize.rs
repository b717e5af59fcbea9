//! Image normalization: bounded size, RGB, JPEG.

use image::{
    codecs::jpeg::JpegEncoder, imageops::FilterType, ColorType, DynamicImage, GenericImageView,
    ImageFormat,
};

use crate::error::{Error, Result};

use super::validate::{jpeg_is_complete, truncated_jpeg};

/// A JPEG image with both sides within the configured bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    /// Encoded JPEG bytes.
    pub bytes: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Decode `bytes`, shrink so neither side exceeds `max_size`, and re-encode
/// as an RGB JPEG.
///
/// Downscaling uses Lanczos3 and preserves the aspect ratio, so the longer
/// side ends up equal to `max_size`. Smaller images are never upscaled.
/// Input that is already an RGB JPEG within bounds is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the bytes cannot be rasterized, or
/// [`Error::ImageSave`] if JPEG encoding fails.
pub fn normalize_image(bytes: &[u8], max_size: u32, quality: u8) -> Result<NormalizedImage> {
    let img = image::load_from_memory(bytes).map_err(|source| Error::Decode { source })?;
    if matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg)) && !jpeg_is_complete(bytes) {
        return Err(Error::Decode {
            source: truncated_jpeg(),
        });
    }
    let (width, height) = img.dimensions();

    let within_bounds = width <= max_size && height <= max_size;
    if within_bounds && is_canonical(bytes, &img) {
        tracing::debug!(width, height, "image already normalized");
        return Ok(NormalizedImage {
            bytes: bytes.to_vec(),
            width,
            height,
        });
    }

    let resized = if within_bounds {
        img
    } else {
        img.resize(max_size, max_size, FilterType::Lanczos3)
    };

    // JPEG has no alpha; grayscale is expanded so downstream always sees RGB
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let (new_width, new_height) = rgb.dimensions();
    tracing::debug!(width, height, new_width, new_height, "image normalized");

    Ok(NormalizedImage {
        bytes: encode_jpeg(&rgb, quality)?,
        width: new_width,
        height: new_height,
    })
}

/// Encode an image as JPEG at the given quality.
pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut output, quality);
    img.write_with_encoder(encoder)
        .map_err(|source| Error::ImageSave { source })?;
    Ok(output)
}

fn is_canonical(bytes: &[u8], img: &DynamicImage) -> bool {
    matches!(image::guess_format(bytes), Ok(ImageFormat::Jpeg)) && img.color() == ColorType::Rgb8
}
