//! HS256 access tokens.

use chrono::Utc;
use clipshelf_core::AppError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "clipshelf-access";

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub sub: Uuid, // user_id
    pub iat: i64,
    pub exp: i64,
}

/// Validates bearer tokens signed with the shared secret
#[derive(Clone)]
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtValidator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a token and return the user it was issued to.
    pub fn validate(&self, token: &str) -> Result<Uuid, AppError> {
        let data = decode::<JwtClaims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidIssuer => {
                    AppError::Unauthorized("Invalid token issuer".to_string())
                }
                _ => AppError::Unauthorized("Couldn't validate JWT".to_string()),
            }
        })?;

        Ok(data.claims.sub)
    }
}

/// Sign an access token for `user_id` valid for `ttl`.
pub fn issue_access_token(user_id: Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    let now = Utc::now().timestamp();
    let claims = JwtClaims {
        iss: TOKEN_ISSUER.to_string(),
        sub: user_id,
        iat: now,
        exp: now + ttl.as_secs() as i64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
}
