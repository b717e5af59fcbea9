//! The style transfer model and how it is invoked.

mod loader;
mod onnx;

pub use loader::{ModelCache, ModelSource};
pub use onnx::OnnxStyleModel;

use std::time::Instant;

use crate::error::Result;
use crate::image::{ensure_image_tensor, ImageTensor, StylizedTensor};

/// An arbitrary image stylization model.
///
/// Implementations take a content and a style tensor, both `[1, H, W, 3]`
/// with values in [0, 1], and return the first tensor the model produces.
/// They are shared across requests, so must be safe to call from several
/// threads at once.
pub trait StyleModel: Send + Sync {
    /// Run the model once.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails.
    fn stylize(&self, content: &ImageTensor, style: &ImageTensor) -> Result<StylizedTensor>;
}

/// Shape-check both inputs, then call `model`.
///
/// The model is not called if either tensor is not a single RGB image.
///
/// # Errors
///
/// Returns [`crate::Error::ShapeMismatch`] for bad input shapes, or whatever
/// the model returns on failure.
pub fn invoke(
    model: &dyn StyleModel,
    content: &ImageTensor,
    style: &ImageTensor,
) -> Result<StylizedTensor> {
    let (content_h, content_w) = ensure_image_tensor(content)?;
    let (style_h, style_w) = ensure_image_tensor(style)?;

    tracing::debug!(
        content = %format_args!("{content_w}x{content_h}"),
        style = %format_args!("{style_w}x{style_h}"),
        "invoking style model"
    );

    let started = Instant::now();
    let stylized = model.stylize(content, style)?;
    tracing::debug!(
        elapsed_ms = started.elapsed().as_millis(),
        shape = ?stylized.shape(),
        "style model finished"
    );

    Ok(stylized)
}
