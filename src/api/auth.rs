use crate::api::error::ApiError;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

/// Optional bearer-token guard for the relay endpoints
#[derive(Debug, Clone)]
pub struct AuthManager {
    /// Valid API tokens (from config); empty disables the check
    valid_tokens: Arc<Vec<String>>,
}

impl AuthManager {
    pub fn new(tokens: Vec<String>) -> Self {
        Self {
            valid_tokens: Arc::new(tokens),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.valid_tokens.is_empty()
    }

    /// Validate bearer token from headers
    pub fn validate_token(&self, headers: &HeaderMap) -> Result<(), ApiError> {
        if !self.is_enabled() {
            return Ok(());
        }

        let auth_header = headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized(
                "Invalid authorization header format. Use: Bearer <token>".to_string(),
            )
        })?;

        if token.is_empty() {
            return Err(ApiError::Unauthorized("Token cannot be empty".to_string()));
        }

        if !self.valid_tokens.iter().any(|t| t == token) {
            tracing::warn!("Invalid token attempt");
            return Err(ApiError::Unauthorized("Invalid token".to_string()));
        }

        Ok(())
    }

    /// Axum middleware for token authentication
    pub async fn auth_middleware(
        State(auth): State<AuthManager>,
        request: Request,
        next: Next,
    ) -> Response {
        match auth.validate_token(request.headers()) {
            Ok(()) => next.run(request).await,
            Err(e) => e.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let auth = AuthManager::new(vec![]);
        assert!(auth.validate_token(&HeaderMap::new()).is_ok());
    }

    #[test]
    fn test_valid_token() {
        let auth = AuthManager::new(vec!["secret".to_string()]);
        assert!(auth.validate_token(&headers("Bearer secret")).is_ok());
    }

    #[test]
    fn test_rejects_missing_or_wrong_token() {
        let auth = AuthManager::new(vec!["secret".to_string()]);
        assert!(auth.validate_token(&HeaderMap::new()).is_err());
        assert!(auth.validate_token(&headers("Bearer nope")).is_err());
        assert!(auth.validate_token(&headers("Basic secret")).is_err());
        assert!(auth.validate_token(&headers("Bearer ")).is_err());
    }
}
