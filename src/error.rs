//! Custom error types for neural-style.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which of the two uploaded images an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The image whose content is kept.
    Content,
    /// The image whose texture is transferred.
    Style,
}

impl Role {
    /// Multipart field name for this role.
    #[must_use]
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Style => "style",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Coarse classification of an [`Error`], used to pick the response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required upload or filename was absent.
    MissingInput,
    /// An upload did not decode as an image.
    InvalidImage,
    /// A validated image could not be rasterized during normalization.
    DecodeError,
    /// Pixels could not be turned into a model tensor.
    TensorConversionError,
    /// The style model failed or returned an unexpected shape.
    ModelInvocationError,
    /// The stylized tensor could not be encoded as JPEG.
    EncodingError,
    /// Anything else: I/O, model loading, configuration.
    Unknown,
}

impl ErrorKind {
    /// Whether the fault lies with the caller's input rather than the service.
    #[must_use]
    pub const fn is_client_fault(self) -> bool {
        matches!(self, Self::MissingInput | Self::InvalidImage)
    }
}

/// Main error type for the neural-style library.
#[derive(Error, Debug)]
pub enum Error {
    /// A required upload part is absent or has no filename.
    #[error("{message}")]
    MissingInput { message: String },

    /// An upload does not decode as an image.
    #[error("Invalid {role} image")]
    InvalidImage {
        role: Role,
        #[source]
        source: image::ImageError,
    },

    /// A validated image could not be rasterized for normalization.
    #[error("failed to decode image: {source}")]
    Decode {
        #[source]
        source: image::ImageError,
    },

    /// A normalized image could not be turned into a model tensor.
    #[error("failed to convert image to tensor: {reason}")]
    TensorConversion { reason: String },

    /// Model inference failed.
    #[error("model inference failed: {source}")]
    Inference {
        #[source]
        source: ort::Error,
    },

    /// Shape mismatch in tensor operations.
    #[error("tensor shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// The model handle could not be used.
    #[error("model invocation failed: {reason}")]
    ModelInvocation { reason: String },

    /// The stylized tensor could not be turned into an image.
    #[error("failed to encode stylized image: {reason}")]
    Encoding { reason: String },

    /// JPEG encoding failed.
    #[error("failed to write JPEG: {source}")]
    ImageSave {
        #[source]
        source: image::ImageError,
    },

    /// Failed to download a model.
    #[error("failed to download model {name}: {source}")]
    ModelDownload {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    /// Failed to load an ONNX model.
    #[error("failed to load ONNX model {name}: {source}")]
    ModelLoad {
        name: String,
        #[source]
        source: ort::Error,
    },

    /// Failed to create cache directory.
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::MissingInput`].
    pub fn missing_input(message: impl Into<String>) -> Self {
        Self::MissingInput {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput { .. } => ErrorKind::MissingInput,
            Self::InvalidImage { .. } => ErrorKind::InvalidImage,
            Self::Decode { .. } => ErrorKind::DecodeError,
            Self::TensorConversion { .. } => ErrorKind::TensorConversionError,
            Self::Inference { .. } | Self::ShapeMismatch { .. } | Self::ModelInvocation { .. } => {
                ErrorKind::ModelInvocationError
            }
            Self::Encoding { .. } | Self::ImageSave { .. } => ErrorKind::EncodingError,
            Self::ModelDownload { .. }
            | Self::ModelLoad { .. }
            | Self::CacheDir { .. }
            | Self::InvalidParameter { .. }
            | Self::Io(_) => ErrorKind::Unknown,
        }
    }
}

/// Result type alias for neural-style operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_fault_kinds() {
        assert!(ErrorKind::MissingInput.is_client_fault());
        assert!(ErrorKind::InvalidImage.is_client_fault());
        assert!(!ErrorKind::DecodeError.is_client_fault());
        assert!(!ErrorKind::ModelInvocationError.is_client_fault());
        assert!(!ErrorKind::Unknown.is_client_fault());
    }

    #[test]
    fn test_invalid_image_names_role() {
        let err = Error::InvalidImage {
            role: Role::Style,
            source: image::ImageError::IoError(std::io::Error::other("truncated")),
        };
        assert_eq!(err.to_string(), "Invalid style image");
        assert_eq!(err.kind(), ErrorKind::InvalidImage);
    }

    #[test]
    fn test_shape_mismatch_is_model_fault() {
        let err = Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: "2D tensor".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::ModelInvocationError);
    }
}
