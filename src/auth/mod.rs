use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::database::manager::DatabaseError;

pub mod code_store;
pub mod pkce;
pub mod token_service;

/// Access-token claims. `sid` ties the token to the refresh session that
/// produced it so revoking the session invalidates future refreshes.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub scope: String,
    pub sid: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, email: String, scope: String, session_id: Uuid) -> Self {
        let now = Utc::now();
        let ttl = config::config().auth.access_token_ttl_secs;

        Self {
            sub: user_id,
            email,
            scope,
            sid: session_id,
            exp: (now + Duration::seconds(ttl as i64)).timestamp(),
            iat: now.timestamp(),
        }
    }
}

/// Errors from the OAuth2 code + PKCE flow and token issuance.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    #[error("Invalid client: {0}")]
    InvalidClient(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid grant: {0}")]
    InvalidGrant(String),

    #[error("Invalid scope: {0}")]
    InvalidScope(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for AuthFlowError {
    fn from(err: sqlx::Error) -> Self {
        AuthFlowError::Database(DatabaseError::from(err))
    }
}

pub fn generate_jwt(claims: &Claims) -> Result<String, AuthFlowError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(AuthFlowError::TokenGeneration("JWT secret not configured".to_string()));
    }

    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
        .map_err(|e| AuthFlowError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, String> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err("JWT secret not configured".to_string());
    }

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| format!("Invalid JWT token: {}", e))?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jwt_round_trip() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "a@b.c".to_string(), "openid portfolio".to_string(), session_id);

        let token = generate_jwt(&claims).unwrap();
        let decoded = validate_jwt(&token).unwrap();

        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.sid, session_id);
        assert_eq!(decoded.scope, "openid portfolio");
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            scope: String::new(),
            sid: Uuid::new_v4(),
            // Past the default validation leeway.
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
            iat: (Utc::now() - Duration::hours(3)).timestamp(),
        };
        let token = generate_jwt(&claims).unwrap();
        assert!(validate_jwt(&token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(validate_jwt("not.a.jwt").is_err());
    }
}
