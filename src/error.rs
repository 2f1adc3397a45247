//! Unified error handling.
//!
//! Route handlers return `Result<T, ApiError>`; the `IntoResponse` impl maps
//! each variant to a status code and a JSON `{"error": ...}` body. Upstream
//! failures are logged and their details are not leaked to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// No session token, or an invalid one.
    #[error("Unauthorized")]
    Unauthenticated,

    /// Valid session, wrong role.
    #[error("Forbidden")]
    Forbidden,

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Webhook signature missing or mismatching; rejected before any state
    /// change.
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::InvalidSignature => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Gateway(_) => StatusCode::BAD_GATEWAY,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "Server error".to_string(),
            Self::Gateway(_) => "Payment gateway error".to_string(),
            other => other.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_code_mapping() {
        assert_eq!(status_of(ApiError::Unauthenticated), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(ApiError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(ApiError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::InvalidSignature), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(ApiError::NotFound("cart".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(ApiError::Gateway("down".into())), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn database_details_are_not_leaked() {
        let response = ApiError::Database(sqlx::Error::PoolTimedOut).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
