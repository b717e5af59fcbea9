//! Encoding of stylized tensors into transportable JPEG images.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageBuffer, Rgb};
use ndarray::{ArrayView3, Axis, Ix4};

use crate::error::{Error, Result};

use super::normalize::encode_jpeg;
use super::{StylizedTensor, RGB_CHANNELS};

/// The final product of a stylization request.
#[derive(Debug, Clone)]
pub struct StylizedImage {
    /// Encoded JPEG bytes.
    pub jpeg: Vec<u8>,
    /// Standard base64 encoding of `jpeg`.
    pub base64: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Convert a `[1, H, W, 3]` tensor with values in [0, 1] into a JPEG image.
///
/// Values are scaled to [0, 255], clamped and truncated.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the tensor is not a single RGB image, or
/// [`Error::ImageSave`] if JPEG encoding fails.
pub fn encode_result(tensor: &StylizedTensor, quality: u8) -> Result<StylizedImage> {
    let view = tensor
        .view()
        .into_dimensionality::<Ix4>()
        .map_err(|_| Error::Encoding {
            reason: format!("expected a 4D tensor, got {}D", tensor.ndim()),
        })?;

    let (batch, height, width, channels) = view.dim();
    if batch != 1 || channels != RGB_CHANNELS || height == 0 || width == 0 {
        return Err(Error::Encoding {
            reason: format!(
                "expected shape [1, H, W, {RGB_CHANNELS}], got {:?}",
                tensor.shape()
            ),
        });
    }

    let img = tensor_to_image(view.index_axis(Axis(0), 0))?;
    let (width, height) = img.dimensions();
    let jpeg = encode_jpeg(&DynamicImage::ImageRgb8(img), quality)?;
    let base64 = STANDARD.encode(&jpeg);

    Ok(StylizedImage {
        jpeg,
        base64,
        width,
        height,
    })
}

/// Convert an HWC tensor to an RGB image.
fn tensor_to_image(hwc: ArrayView3<'_, f32>) -> Result<ImageBuffer<Rgb<u8>, Vec<u8>>> {
    let (height, width, _) = hwc.dim();
    let too_large = |_: std::num::TryFromIntError| Error::Encoding {
        reason: format!("image dimensions {width}x{height} are too large"),
    };
    let width = u32::try_from(width).map_err(too_large)?;
    let height = u32::try_from(height).map_err(too_large)?;

    // Iteration is in logical order, so non-contiguous views are fine
    let pixels: Vec<u8> = hwc.iter().copied().map(denormalize).collect();

    ImageBuffer::from_raw(width, height, pixels).ok_or_else(|| Error::Encoding {
        reason: "pixel buffer does not match image dimensions".to_string(),
    })
}

/// Denormalize a value from [0, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    (value * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use ndarray::{ArrayD, IxDyn};

    use super::*;
    use crate::error::ErrorKind;

    fn filled(height: usize, width: usize, value: f32) -> StylizedTensor {
        ArrayD::from_elem(IxDyn(&[1, height, width, 3]), value)
    }

    fn decode(result: &StylizedImage) -> image::RgbImage {
        let decoded = STANDARD.decode(&result.base64).unwrap();
        assert_eq!(decoded, result.jpeg);
        image::load_from_memory(&decoded).unwrap().to_rgb8()
    }

    #[test]
    fn test_denormalize() {
        assert_eq!(denormalize(0.0), 0);
        assert_eq!(denormalize(0.5), 127);
        assert_eq!(denormalize(1.0), 255);
    }

    #[test]
    fn test_denormalize_clamp() {
        assert_eq!(denormalize(-2.0), 0);
        assert_eq!(denormalize(2.0), 255);
        assert_eq!(denormalize(f32::NAN), 0);
    }

    #[test]
    fn test_zeros_encode_black() {
        let result = encode_result(&filled(16, 24, 0.0), 95).unwrap();
        assert_eq!((result.width, result.height), (24, 16));

        let img = decode(&result);
        assert_eq!(img.dimensions(), (24, 16));
        assert!(img.pixels().all(|p| p.0.iter().all(|&c| c <= 2)));
    }

    #[test]
    fn test_ones_encode_white() {
        let img = decode(&encode_result(&filled(16, 16, 1.0), 95).unwrap());
        assert!(img.pixels().all(|p| p.0.iter().all(|&c| c >= 253)));
    }

    #[test]
    fn test_wrong_rank_rejected() {
        let tensor = ArrayD::<f32>::zeros(IxDyn(&[16, 16, 3]));
        let err = encode_result(&tensor, 95).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EncodingError);
    }

    #[test]
    fn test_bad_shape_rejected() {
        for shape in [[2, 8, 8, 3], [1, 8, 8, 4], [1, 0, 8, 3], [1, 8, 0, 3]] {
            let tensor = ArrayD::<f32>::zeros(IxDyn(&shape));
            assert!(encode_result(&tensor, 95).is_err(), "{shape:?}");
        }
    }
}
