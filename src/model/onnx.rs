//! ONNX Runtime backed style model.

use std::path::Path;
use std::sync::Mutex;

use ndarray::{ArrayD, IxDyn};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::{ImageTensor, StylizedTensor};

use super::StyleModel;

/// The arbitrary image stylization network loaded into an ONNX Runtime session.
///
/// The graph takes the content tensor as its first input and the style
/// tensor as its second; the stylized image is its first output.
/// `Session::run` needs exclusive access, so calls are serialized.
pub struct OnnxStyleModel {
    session: Mutex<Session>,
}

impl OnnxStyleModel {
    /// Wrap an already built session.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Build a session from a model file.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be loaded.
    pub fn from_file(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: name.clone(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad { name, source })?;

        Ok(Self::new(session))
    }
}

impl StyleModel for OnnxStyleModel {
    fn stylize(&self, content: &ImageTensor, style: &ImageTensor) -> Result<StylizedTensor> {
        let content_value =
            Tensor::from_array(content.clone()).map_err(|source| Error::Inference { source })?;
        let style_value =
            Tensor::from_array(style.clone()).map_err(|source| Error::Inference { source })?;

        let mut session = self.session.lock().map_err(|_| Error::ModelInvocation {
            reason: "model session lock poisoned".to_string(),
        })?;

        let outputs = session
            .run(ort::inputs![content_value, style_value])
            .map_err(|source| Error::Inference { source })?;

        // Get first output
        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "stylized image output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_array(&output)
    }
}

/// Extract a dynamically shaped array from an ONNX value.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_array(value: &ort::value::ValueRef<'_>) -> Result<ArrayD<f32>> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::Inference { source })?;

    let raw_dims: Vec<i64> = shape_info.iter().copied().collect();
    if raw_dims.iter().any(|&x| x < 0) {
        return Err(Error::ShapeMismatch {
            expected: "concrete output shape".to_string(),
            actual: format!("{raw_dims:?}"),
        });
    }

    // Safe: dimensions checked non-negative above
    let dims: Vec<usize> = raw_dims.iter().map(|&x| x as usize).collect();

    ArrayD::from_shape_vec(IxDyn(&dims), data.to_vec()).map_err(|_| Error::ShapeMismatch {
        expected: format!("{dims:?}"),
        actual: "reshape failed".to_string(),
    })
}
