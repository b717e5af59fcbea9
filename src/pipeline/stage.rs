//! Request pipeline states.

use std::fmt;

/// The last stage a request completed.
///
/// Stages run strictly in declaration order; a failure stops the request at
/// whichever stage it had reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    /// Both uploads are present.
    Received,
    /// Both uploads decode as images.
    Validated,
    /// Both images are bounded RGB JPEGs.
    Normalized,
    /// Both images are model tensors.
    Prepared,
    /// The model produced an output tensor.
    Stylized,
    /// The output is a JPEG and base64 string.
    Encoded,
    /// The result was sent to the client.
    Responded,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::Normalized => "normalized",
            Self::Prepared => "prepared",
            Self::Stylized => "stylized",
            Self::Encoded => "encoded",
            Self::Responded => "responded",
        };
        f.write_str(name)
    }
}
