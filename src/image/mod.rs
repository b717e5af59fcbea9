//! Image validation, normalization, tensor conversion and encoding.

mod encode;
mod normalize;
mod source;
mod tensor;
mod validate;

pub use encode::{encode_result, StylizedImage};
pub use normalize::{normalize_image, NormalizedImage};
pub use source::{ImageSource, UploadedImage};
pub use tensor::{ensure_image_tensor, prepare_tensor};
pub use validate::validate_image;

use ndarray::{Array4, ArrayD};

/// Image tensor in NHWC format (batch, height, width, channels).
/// Values are normalized to [0, 1].
pub type ImageTensor = Array4<f32>;

/// Raw model output. Expected to follow the [`ImageTensor`] layout, but the
/// shape is only known at runtime.
pub type StylizedTensor = ArrayD<f32>;

/// Default bound on either side of a normalized image.
pub const DEFAULT_MAX_SIZE: u32 = 512;

/// Default JPEG quality for normalized and stylized images.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
