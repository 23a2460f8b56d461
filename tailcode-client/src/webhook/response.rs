use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt::Display;
use tailcode_shared::webhook::ErrorResponse;
use tracing::warn;

/// Request failures, rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum WebhookError {
    Unauthorized,
    BadRequest(String),
    NotFound(String),
}

impl Display for WebhookError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WebhookError::Unauthorized => write!(f, "unauthorized"),
            WebhookError::BadRequest(message) => write!(f, "{}", message),
            WebhookError::NotFound(message) => write!(f, "{}", message),
        }
    }
}

impl WebhookError {
    pub fn bad_request(message: &str) -> Self {
        WebhookError::BadRequest(message.to_string())
    }

    pub fn not_found(message: &str) -> Self {
        WebhookError::NotFound(message.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebhookError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!("Returning error response {} {}", status, self);
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub type WebhookResult<T> = Result<Json<T>, WebhookError>;
