use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Failure taxonomy of the review service.
///
/// Conditions are classified where they are detected and passed through unchanged to the HTTP
/// boundary, where each variant maps to exactly one status code.
#[derive(Error, Debug)]
pub enum ReviewError {
    /// Bad shape or bounds of client input. Never reaches storage or remote calls.
    #[error("{0}")]
    Validation(String),

    /// Review, movie or user is absent.
    #[error("{0}")]
    NotFound(String),

    #[error("User of UUID: `{user_id}` has already written a review for movie of UUID: `{movie_id}`.")]
    DuplicateReview { movie_id: Uuid, user_id: Uuid },

    /// A remote dependency required on this path failed or timed out.
    #[error("{0}")]
    DependencyUnavailable(String),

    /// Opaque persistence failure.
    #[error("{0}")]
    StorageFailure(String),
}

impl ReviewError {
    pub fn review_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Review with UUID: `{}` not found.", id))
    }

    pub fn movie_not_found(id: Uuid) -> Self {
        Self::NotFound(format!("Movie with UUID: `{}` not found.", id))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ReviewError::Validation(_) => StatusCode::BAD_REQUEST,
            ReviewError::NotFound(_) => StatusCode::NOT_FOUND,
            ReviewError::DuplicateReview { .. } => StatusCode::CONFLICT,
            ReviewError::DependencyUnavailable(_) => StatusCode::BAD_GATEWAY,
            ReviewError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders the error as `{"error": message}`.
///
/// Storage failures are logged with their detail and answered with a generic message.
impl IntoResponse for ReviewError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ReviewError::StorageFailure(detail) => {
                error!("Storage failure: {}", detail);
                "Review storage is currently unavailable.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
