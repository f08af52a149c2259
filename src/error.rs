//! Request-terminal errors and their HTTP rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::slack::{SignatureError, SlackApiError};

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Only POST requests are accepted")]
    MethodNotAllowed,

    #[error("Invalid credentials: {0}")]
    Authentication(#[from] SignatureError),

    #[error("Unexpected Slack event")]
    UnexpectedEvent,

    #[error("Unhandled error: {0}")]
    Unhandled(String),

    #[error("Slack API call failed: {0}")]
    Slack(#[from] SlackApiError),
}

impl HookError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed | Self::UnexpectedEvent => StatusCode::METHOD_NOT_ALLOWED,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Unhandled(_) | Self::Slack(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Authentication(_) => "AUTHENTICATION",
            Self::UnexpectedEvent => "UNEXPECTED_EVENT",
            Self::Unhandled(_) | Self::Slack(_) => "UNHANDLED",
        }
    }
}

/// Body sent back to Slack on failure.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub code: u16,
    pub message: String,
}

impl IntoResponse for HookError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("Request failed with {}: {}", status, self);

        let body = ErrorResponse {
            error: self.code(),
            code: status.as_u16(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
