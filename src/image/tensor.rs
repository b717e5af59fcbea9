//! Conversion from normalized images to model tensors.

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{Error, Result};

use super::{ImageTensor, NormalizedImage, RGB_CHANNELS};

/// Decode a normalized image into a `[1, H, W, 3]` tensor with values in [0, 1].
///
/// # Errors
///
/// Returns [`Error::TensorConversion`] if the image cannot be decoded or
/// has a zero dimension.
pub fn prepare_tensor(image: &NormalizedImage) -> Result<ImageTensor> {
    let img = image::load_from_memory(&image.bytes).map_err(|e| Error::TensorConversion {
        reason: e.to_string(),
    })?;

    image_to_tensor(&img)
}

/// Convert a `DynamicImage` to a normalized NHWC tensor.
fn image_to_tensor(img: &DynamicImage) -> Result<ImageTensor> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::TensorConversion {
            reason: format!("image has zero dimension {width}x{height}"),
        });
    }

    let rgb = img.to_rgb8();
    let data: Vec<f32> = rgb.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();

    // Row-major RGB bytes already match the NHWC layout
    Array4::from_shape_vec(
        (1, height as usize, width as usize, RGB_CHANNELS),
        data,
    )
    .map_err(|e| Error::TensorConversion {
        reason: e.to_string(),
    })
}

/// Check that `tensor` holds exactly one RGB image and return its (height, width).
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] if the batch or channel axis is wrong or
/// an image dimension is zero.
pub fn ensure_image_tensor(tensor: &ImageTensor) -> Result<(usize, usize)> {
    let (batch, height, width, channels) = tensor.dim();
    if batch != 1 || channels != RGB_CHANNELS || height == 0 || width == 0 {
        return Err(Error::ShapeMismatch {
            expected: format!("[1, H, W, {RGB_CHANNELS}]"),
            actual: format!("{:?}", tensor.shape()),
        });
    }
    Ok((height, width))
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Rgb, RgbImage, RgbaImage};

    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_tensor_shape() {
        let img = DynamicImage::new_rgb8(100, 40);
        let tensor = image_to_tensor(&img).unwrap();

        assert_eq!(tensor.shape(), &[1, 40, 100, 3]);
    }

    #[test]
    fn test_normalization_range() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        }));
        let tensor = image_to_tensor(&img).unwrap();

        let min = tensor.iter().copied().fold(f32::INFINITY, f32::min);
        let max = tensor.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        assert!(min.abs() < f32::EPSILON);
        assert!((max - 1.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 1, 3, 2]] - 1.0).abs() < f32::EPSILON);
        assert!(tensor[[0, 1, 0, 0]].abs() < f32::EPSILON);
    }

    #[test]
    fn test_channel_order() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(1, 1, Rgb([255, 0, 51])));
        let tensor = image_to_tensor(&img).unwrap();

        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 0, 0, 1]].abs() < 1e-6);
        assert!((tensor[[0, 0, 0, 2]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_and_gray_yield_three_channels() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(5, 3));
        let gray = DynamicImage::ImageLuma8(GrayImage::new(5, 3));

        assert_eq!(image_to_tensor(&rgba).unwrap().shape(), &[1, 3, 5, 3]);
        assert_eq!(image_to_tensor(&gray).unwrap().shape(), &[1, 3, 5, 3]);
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let img = DynamicImage::new_rgb8(0, 10);
        let err = image_to_tensor(&img).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TensorConversionError);
    }

    #[test]
    fn test_malformed_bytes_rejected() {
        let image = NormalizedImage {
            bytes: vec![0xFF, 0xD8, 0x00],
            width: 1,
            height: 1,
        };
        let err = prepare_tensor(&image).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TensorConversionError);
    }

    #[test]
    fn test_ensure_image_tensor() {
        assert_eq!(
            ensure_image_tensor(&Array4::zeros((1, 4, 6, 3))).unwrap(),
            (4, 6)
        );
        assert!(ensure_image_tensor(&Array4::zeros((2, 4, 6, 3))).is_err());
        assert!(ensure_image_tensor(&Array4::zeros((1, 4, 6, 4))).is_err());
        assert!(ensure_image_tensor(&Array4::zeros((1, 0, 6, 3))).is_err());
    }
}
