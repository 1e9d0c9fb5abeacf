use crate::error::HttpAppError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts, HeaderMap};
use clipshelf_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

/// The caller, as identified by a valid bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
}

impl AuthUser {
    /// Authenticate from request headers.
    ///
    /// Handlers that must validate their path before authenticating call
    /// this directly instead of using the extractor.
    pub fn from_headers(headers: &HeaderMap, state: &AppState) -> Result<Self, HttpAppError> {
        let token = bearer_token(headers)?;
        let user_id = state.jwt.validate(token)?;
        Ok(AuthUser { user_id })
    }
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        )),
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = HttpAppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        AuthUser::from_headers(&parts.headers, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_err());

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
