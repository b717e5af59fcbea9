//! HTTP error responses.

use axum::{
    extract::multipart::{MultipartError, MultipartRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// JSON body of every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Wrapper so library errors can be returned from handlers.
#[derive(Debug)]
pub enum ApiError {
    /// The request body did not carry two usable uploads.
    Request(Error),
    /// The pipeline failed; `Pipeline::run` has already logged it.
    Pipeline(Error),
    /// The blocking task running the pipeline did not complete.
    Task(tokio::task::JoinError),
}

impl ApiError {
    /// Status code for this error: caller faults are 400, everything else 500.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Request(err) | Self::Pipeline(err) if err.kind().is_client_fault() => {
                StatusCode::BAD_REQUEST
            }
            Self::Request(_) | Self::Pipeline(_) | Self::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether this error still has to be logged when it becomes a response.
    #[must_use]
    pub const fn needs_logging(&self) -> bool {
        !matches!(self, Self::Pipeline(_))
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Request(err) | Self::Pipeline(err) => err.kind(),
            Self::Task(_) => ErrorKind::Unknown,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Request(err) | Self::Pipeline(err) if err.kind().is_client_fault() => {
                err.to_string()
            }
            Self::Request(err) | Self::Pipeline(err) => format!("An error occurred: {err}"),
            Self::Task(err) => format!("An error occurred: {err}"),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Request(err)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err)
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::Request(Error::missing_input(format!(
            "Expected a multipart form: {}",
            rejection.body_text()
        )))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        Self::Request(Error::missing_input(format!(
            "Failed to read multipart: {}",
            err.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !self.needs_logging() {
            // already reported with the stage it failed at
        } else if status.is_server_error() {
            tracing::error!(kind = ?self.kind(), "request failed: {}", self.client_message());
        } else {
            tracing::debug!(kind = ?self.kind(), "request rejected: {}", self.client_message());
        }

        let body = Json(ErrorResponse {
            error: self.client_message(),
        });
        (status, body).into_response()
    }
}
