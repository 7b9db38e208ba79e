use crate::guard::GuardError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Internal server error (500)
    InternalError(String),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error message
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::InternalError(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({ "error": self.message() });
        (status, axum::Json(body)).into_response()
    }
}

impl From<GuardError> for ApiError {
    fn from(err: GuardError) -> Self {
        if err.is_client_error() {
            tracing::debug!("Action refused: {}", err);
            Self::BadRequest(err.to_string())
        } else {
            tracing::error!("Action failed: {}", err);
            Self::InternalError(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        tracing::error!("Internal error: {:?}", err);
        Self::InternalError("Internal server error".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("test".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("test".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InternalError("test".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_guard_error_mapping() {
        let err: ApiError = GuardError::NotConnected.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Please connect to Altura Guard first.");

        let err: ApiError = GuardError::Rejected.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = GuardError::ConnectFailure("timeout".into()).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
