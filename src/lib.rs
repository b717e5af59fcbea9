//! # neural-style
//!
//! An HTTP service that renders a content image in the style of a second
//! image using a pretrained arbitrary image stylization network.
//!
//! Uploads are validated, bounded to a maximum side length, turned into
//! `[1, H, W, 3]` tensors in [0, 1], run through the model and encoded back
//! to a base64 JPEG. The model is any [`StyleModel`]; the binary uses an
//! ONNX export loaded through ONNX Runtime.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use neural_style::image::UploadedImage;
//! use neural_style::model::{ModelCache, ModelSource};
//! use neural_style::{Config, Pipeline};
//!
//! # fn main() -> neural_style::Result<()> {
//! let model = ModelCache::new()?.load(&ModelSource::parse("style.onnx"))?;
//! let pipeline = Pipeline::new(Config::default(), Arc::new(model))?;
//!
//! let mut content = UploadedImage::new("photo.jpg", std::fs::read("photo.jpg")?);
//! let mut style = UploadedImage::new("wave.png", std::fs::read("wave.png")?);
//! let stylized = pipeline.run(&mut content, &mut style)?;
//! std::fs::write("out.jpg", &stylized.jpeg)?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;
pub mod server;

pub use error::{Error, ErrorKind, Result, Role};
pub use model::StyleModel;
pub use pipeline::{Config, Pipeline};
