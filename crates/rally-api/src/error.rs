use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use rally_store::StoreError;
use rally_types::api::MessageResponse;

pub const AUTH_REQUIRED: &str = "Authentication required";

/// Every failure surfaces to clients as `{"message": ...}` plus a status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    /// Duplicate completion. Reported as 400 like other bad requests.
    #[error("{0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn auth_required() -> Self {
        Self::Unauthorized(AUTH_REQUIRED.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::Conflict(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match self {
            ApiError::Internal(e) => {
                error!("Internal error: {:#}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(MessageResponse::new(message))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            StoreError::AlreadyCompleted => ApiError::Conflict(e.to_string()),
            StoreError::InvalidInput(msg) => ApiError::Validation(msg),
            StoreError::Poisoned => ApiError::Internal(anyhow::anyhow!(e)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_status() {
        let cases = [
            (
                StoreError::NotFound { entity: "User", id: 1 },
                StatusCode::NOT_FOUND,
            ),
            (StoreError::AlreadyCompleted, StatusCode::BAD_REQUEST),
            (StoreError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (StoreError::Poisoned, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_auth_required_is_401() {
        let resp = ApiError::auth_required().into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
