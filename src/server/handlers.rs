//! Route handlers.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use serde::Serialize;

use crate::error::{Error, Role};
use crate::image::UploadedImage;
use crate::pipeline::Stage;

use super::error::ApiError;
use super::AppState;

/// Liveness text returned by `GET /`.
pub const LIVENESS_MESSAGE: &str = "Neural style transfer service is running";

/// JSON body of a successful stylization.
#[derive(Debug, Serialize)]
pub struct StylizeResponse {
    /// Base64-encoded JPEG.
    pub stylized_image: String,
}

/// `GET /`
pub async fn health() -> &'static str {
    LIVENESS_MESSAGE
}

/// `POST /stylize`
///
/// Expects multipart parts `content` and `style`, runs the pipeline on the
/// blocking pool and answers with the base64 JPEG.
#[tracing::instrument(skip_all)]
pub async fn stylize(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<StylizeResponse>, ApiError> {
    let (mut content, mut style) = read_uploads(multipart?).await?;
    tracing::debug!(
        content = content.len(),
        style = style.len(),
        "received uploads"
    );

    let pipeline = Arc::clone(&state.pipeline);
    let result = tokio::task::spawn_blocking(move || pipeline.run(&mut content, &mut style))
        .await?
        .map_err(ApiError::Pipeline)?;

    tracing::debug!(stage = %Stage::Responded, "pipeline stage");
    Ok(Json(StylizeResponse {
        stylized_image: result.base64,
    }))
}

/// Pull the `content` and `style` parts out of the form. Other parts are ignored.
async fn read_uploads(mut multipart: Multipart) -> Result<(UploadedImage, UploadedImage), ApiError> {
    let mut content = None;
    let mut style = None;

    while let Some(field) = multipart.next_field().await? {
        let slot = match field.name() {
            Some(name) if name == Role::Content.field_name() => &mut content,
            Some(name) if name == Role::Style.field_name() => &mut style,
            _ => continue,
        };
        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        *slot = Some(UploadedImage::new(filename, data));
    }

    match (content, style) {
        (Some(content), Some(style)) => Ok((content, style)),
        _ => Err(Error::missing_input("Both content and style images are required").into()),
    }
}
