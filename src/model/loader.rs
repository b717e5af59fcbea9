//! Model downloading and loading utilities.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

use super::OnnxStyleModel;

/// Filename used when a model URL has no usable last path segment.
const FALLBACK_FILENAME: &str = "arbitrary_image_stylization.onnx";

/// Where the style transfer model comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// An ONNX file already on disk.
    Path(PathBuf),
    /// An ONNX file to download into the cache on first use.
    Url(String),
}

impl ModelSource {
    /// Interpret `value` as a URL if it has an http(s) scheme, else as a path.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_string())
        } else {
            Self::Path(PathBuf::from(value))
        }
    }
}

/// Manages the model cache directory and downloads.
pub struct ModelCache {
    cache_dir: PathBuf,
}

impl ModelCache {
    /// Create a new model cache.
    ///
    /// Uses the platform-appropriate cache directory:
    /// - Windows: `%LOCALAPPDATA%\neural-style\models`
    /// - Linux: `~/.cache/neural-style/models`
    /// - macOS: `~/Library/Caches/neural-style/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created.
    pub fn new() -> Result<Self> {
        let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::with_dir(base.join("neural-style").join("models"))
    }

    /// Create a cache rooted at `cache_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_dir(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();

        fs::create_dir_all(&cache_dir).map_err(|source| Error::CacheDir {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self { cache_dir })
    }

    /// Get the path to the model file, downloading if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if a local model is missing or a remote one cannot
    /// be downloaded.
    pub fn get_model_path(&self, source: &ModelSource) -> Result<PathBuf> {
        match source {
            ModelSource::Path(path) => {
                if !path.is_file() {
                    return Err(Error::InvalidParameter {
                        name: "model".to_string(),
                        reason: format!("{} is not a file", path.display()),
                    });
                }
                Ok(path.clone())
            }
            ModelSource::Url(url) => {
                let filename = file_name_for_url(url);
                let path = self.cache_dir.join(filename);
                if path.exists() {
                    tracing::debug!("Using cached model {}", path.display());
                } else {
                    download_file(url, &path, filename)?;
                }
                Ok(path)
            }
        }
    }

    /// Resolve and load the style model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be found, downloaded, or loaded.
    pub fn load(&self, source: &ModelSource) -> Result<OnnxStyleModel> {
        let path = self.get_model_path(source)?;
        tracing::info!("Loading style model from {}", path.display());
        OnnxStyleModel::from_file(&path)
    }
}

/// Last path segment of `url`, ignoring any query string or fragment.
fn file_name_for_url(url: &str) -> &str {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    without_query
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && !name.contains(':'))
        .unwrap_or(FALLBACK_FILENAME)
}

/// Download a file from a URL to a path with progress indication.
#[allow(clippy::cast_possible_truncation)]
fn download_file(url: &str, path: &Path, name: &str) -> Result<()> {
    tracing::info!("Downloading {name} from {url}");

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(|source| Error::ModelDownload {
            name: name.to_string(),
            source,
        })?;

    let pb = response
        .content_length()
        .map_or_else(ProgressBar::new_spinner, ProgressBar::new);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("valid template")
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Downloading {name}"));

    // Write to a temporary file first, then rename for atomicity
    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;

    let mut downloaded = 0u64;
    let mut reader = response;

    loop {
        let mut buffer = [0u8; 8192];
        let bytes_read = std::io::Read::read(&mut reader, &mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    pb.finish_with_message(format!("Downloaded {name}"));

    fs::rename(&temp_path, path)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_source() {
        assert_eq!(
            ModelSource::parse("https://host/models/style.onnx"),
            ModelSource::Url("https://host/models/style.onnx".to_string())
        );
        assert_eq!(
            ModelSource::parse("models/style.onnx"),
            ModelSource::Path(PathBuf::from("models/style.onnx"))
        );
    }

    #[test]
    fn test_file_name_for_url() {
        assert_eq!(
            file_name_for_url("https://host/a/model.onnx?download=true"),
            "model.onnx"
        );
        assert_eq!(file_name_for_url("https://host/a/"), FALLBACK_FILENAME);
        assert_eq!(file_name_for_url("https://"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_missing_local_model() {
        let cache = ModelCache::with_dir(std::env::temp_dir().join("neural-style-test")).unwrap();
        let source = ModelSource::Path(PathBuf::from("/definitely/not/here.onnx"));
        let err = cache.get_model_path(&source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }
}
