use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// A rejected request field. Produced by the validator before any generation
/// work is started.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("prompt is required")]
    MissingPrompt,
    #[error("invalid genre: {0}")]
    InvalidGenre(String),
    #[error("invalid length: {0}")]
    InvalidLength(String),
    #[error("temperature must be between 0.0 and 1.0, got {0}")]
    InvalidTemperature(String),
    #[error("top_p must be between 0.0 and 1.0, got {0}")]
    InvalidTopP(String),
    #[error("max_tokens must be a positive integer, got {0}")]
    InvalidMaxTokens(String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingPrompt => "prompt",
            ValidationError::InvalidGenre(_) => "genre",
            ValidationError::InvalidLength(_) => "length",
            ValidationError::InvalidTemperature(_) => "temperature",
            ValidationError::InvalidTopP(_) => "top_p",
            ValidationError::InvalidMaxTokens(_) => "max_tokens",
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("model backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("generation queue is full")]
    QueueFull,
    #[error("model generation failed: {0}")]
    BackendGeneration(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) | ServiceError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServiceError::BackendUnavailable(_) | ServiceError::QueueFull => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ServiceError::BackendGeneration(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(%status, error = %self, "request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
