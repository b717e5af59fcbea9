//! The content + style to stylized image pipeline.

use std::sync::Arc;

use crate::error::{Error, Result, Role};
use crate::image::{
    self, ImageSource, ImageTensor, NormalizedImage, StylizedImage, DEFAULT_JPEG_QUALITY,
    DEFAULT_MAX_SIZE,
};
use crate::model::{self, StyleModel};

use super::Stage;

/// Configuration for the stylization pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upper bound on either side of the images fed to the model.
    pub max_size: u32,

    /// JPEG quality (1-100) for normalized and output images.
    pub output_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            output_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::InvalidParameter {
                name: "max_size".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        Ok(())
    }
}

/// Validates, normalizes and stylizes a content/style image pair.
///
/// The pipeline holds no per-request state, so one instance can serve many
/// requests concurrently. The model handle is the only shared resource.
pub struct Pipeline {
    config: Config,
    model: Arc<dyn StyleModel>,
}

impl Pipeline {
    /// Create a new pipeline around an already loaded model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config, model: Arc<dyn StyleModel>) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        Ok(Self { config, model })
    }

    /// Stylize `content` with the texture of `style`.
    ///
    /// Either the whole pipeline succeeds or nothing is returned; the first
    /// failing stage ends the run.
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that fails.
    pub fn run<C, S>(&self, content: &mut C, style: &mut S) -> Result<StylizedImage>
    where
        C: ImageSource + ?Sized,
        S: ImageSource + ?Sized,
    {
        let mut stage = Stage::Received;
        let outcome = self.run_stages(content, style, &mut stage);

        match &outcome {
            Ok(result) => tracing::info!(
                width = result.width,
                height = result.height,
                bytes = result.jpeg.len(),
                "stylization complete"
            ),
            Err(err) => tracing::warn!(
                reached = %stage,
                kind = ?err.kind(),
                "stylization failed: {err}"
            ),
        }

        outcome
    }

    fn run_stages<C, S>(
        &self,
        content: &mut C,
        style: &mut S,
        stage: &mut Stage,
    ) -> Result<StylizedImage>
    where
        C: ImageSource + ?Sized,
        S: ImageSource + ?Sized,
    {
        if content.filename().is_empty() || style.filename().is_empty() {
            return Err(Error::missing_input("No selected file"));
        }

        image::validate_image(content, Role::Content)?;
        image::validate_image(style, Role::Style)?;
        advance(stage, Stage::Validated);

        let content = self.normalize(content)?;
        let style = self.normalize(style)?;
        advance(stage, Stage::Normalized);

        let content: ImageTensor = image::prepare_tensor(&content)?;
        let style: ImageTensor = image::prepare_tensor(&style)?;
        advance(stage, Stage::Prepared);

        let stylized = model::invoke(self.model.as_ref(), &content, &style)?;
        advance(stage, Stage::Stylized);

        let encoded = image::encode_result(&stylized, self.config.output_quality)?;
        advance(stage, Stage::Encoded);

        Ok(encoded)
    }

    fn normalize<S: ImageSource + ?Sized>(&self, source: &mut S) -> Result<NormalizedImage> {
        let bytes = source.read_remaining()?;
        image::normalize_image(&bytes, self.config.max_size, self.config.output_quality)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!(from = %stage, to = %next, "pipeline stage");
    *stage = next;
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use ::image::{DynamicImage, ImageFormat, RgbImage};

    use super::*;
    use crate::error::ErrorKind;
    use crate::image::{StylizedTensor, UploadedImage};

    /// Returns the content tensor and records the shapes it saw.
    #[derive(Default)]
    struct Echo {
        calls: AtomicUsize,
        shapes: std::sync::Mutex<Vec<Vec<usize>>>,
    }

    impl StyleModel for Echo {
        fn stylize(&self, content: &ImageTensor, style: &ImageTensor) -> Result<StylizedTensor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut shapes = self.shapes.lock().unwrap();
            shapes.push(content.shape().to_vec());
            shapes.push(style.shape().to_vec());
            Ok(content.clone().into_dyn())
        }
    }

    struct Failing;

    impl StyleModel for Failing {
        fn stylize(&self, _: &ImageTensor, _: &ImageTensor) -> Result<StylizedTensor> {
            Err(Error::ModelInvocation {
                reason: "out of memory".to_string(),
            })
        }
    }

    fn upload(name: &str, width: u32, height: u32, format: ImageFormat) -> UploadedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        UploadedImage::new(name, out.into_inner())
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());
        assert!(Config {
            max_size: 0,
            ..Config::default()
        }
        .validate()
        .is_err());
        assert!(Config {
            output_quality: 0,
            ..Config::default()
        }
        .validate()
        .is_err());
    }

    #[test]
    fn test_content_downscaled_style_untouched() {
        let model = Arc::new(Echo::default());
        let pipeline = Pipeline::new(Config::default(), model.clone()).unwrap();

        let mut content = upload("content.jpg", 1000, 500, ImageFormat::Jpeg);
        let mut style = upload("style.png", 300, 300, ImageFormat::Png);
        let result = pipeline.run(&mut content, &mut style).unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            *model.shapes.lock().unwrap(),
            vec![vec![1, 256, 512, 3], vec![1, 300, 300, 3]]
        );
        assert_eq!((result.width, result.height), (512, 256));
        assert!(!result.base64.is_empty());
    }

    #[test]
    fn test_invalid_style_stops_before_model() {
        let model = Arc::new(Echo::default());
        let pipeline = Pipeline::new(Config::default(), model.clone()).unwrap();

        let mut content = upload("content.png", 64, 64, ImageFormat::Png);
        let mut style = UploadedImage::new("style.png", b"GIF89a but not really".to_vec());
        let err = pipeline.run(&mut content, &mut style).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidImage);
        assert_eq!(err.to_string(), "Invalid style image");
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_filename_is_missing_input() {
        let model = Arc::new(Echo::default());
        let pipeline = Pipeline::new(Config::default(), model.clone()).unwrap();

        let mut content = upload("", 16, 16, ImageFormat::Png);
        let mut style = upload("style.png", 16, 16, ImageFormat::Png);
        let err = pipeline.run(&mut content, &mut style).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingInput);
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_model_failure_is_surfaced() {
        let pipeline = Pipeline::new(Config::default(), Arc::new(Failing)).unwrap();

        let mut content = upload("content.png", 16, 16, ImageFormat::Png);
        let mut style = upload("style.png", 16, 16, ImageFormat::Png);
        let err = pipeline.run(&mut content, &mut style).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModelInvocationError);
        assert!(!err.kind().is_client_fault());
    }
}
