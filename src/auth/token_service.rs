use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{generate_jwt, AuthFlowError, Claims};
use crate::config;
use crate::database::models::{User, UserSession};

/// Client metadata captured alongside a session.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Token pair returned by the token endpoint.
#[derive(Debug, Serialize)]
pub struct IssuedTokens {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub refresh_token: String,
    pub scope: String,
}

/// Issues access tokens and manages refresh-token sessions: opaque refresh
/// tokens stored hashed, 7-day expiry, and a rotation cap of active sessions
/// per user (oldest revoked on overflow).
pub struct TokenService {
    pool: PgPool,
}

impl TokenService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn issue(
        &self,
        user: &User,
        scope: &str,
        ctx: &RequestContext,
    ) -> Result<IssuedTokens, AuthFlowError> {
        let auth_config = &config::config().auth;
        let now = Utc::now();

        let session_id = Uuid::new_v4();
        let refresh_token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let refresh_hash = hash_refresh_token(&refresh_token);
        let expires_at = now + Duration::days(auth_config.refresh_token_ttl_days);

        sqlx::query(
            "INSERT INTO user_sessions \
             (id, user_id, refresh_token_hash, scope, user_agent, ip_address, created_at, expires_at, last_seen_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $7)",
        )
        .bind(session_id)
        .bind(user.id)
        .bind(&refresh_hash)
        .bind(scope)
        .bind(&ctx.user_agent)
        .bind(&ctx.ip_address)
        .bind(now)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        self.enforce_session_cap(user.id, auth_config.max_refresh_tokens_per_user)
            .await?;

        let claims = Claims::new(user.id, user.email.clone(), scope.to_string(), session_id);
        let access_token = generate_jwt(&claims)?;

        info!(user_id = %user.id, session_id = %session_id, "Issued token pair");

        Ok(IssuedTokens {
            access_token,
            token_type: "Bearer",
            expires_in: auth_config.access_token_ttl_secs,
            refresh_token,
            scope: scope.to_string(),
        })
    }

    /// Rotate a refresh token: the presented session is revoked and a fresh
    /// pair issued carrying the session's original scope. An unknown, revoked
    /// or expired token is an invalid grant.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ctx: &RequestContext,
    ) -> Result<IssuedTokens, AuthFlowError> {
        let refresh_hash = hash_refresh_token(refresh_token);

        let session: Option<UserSession> = sqlx::query_as(
            "SELECT * FROM user_sessions \
             WHERE refresh_token_hash = $1 AND revoked_at IS NULL AND expires_at > now()",
        )
        .bind(&refresh_hash)
        .fetch_optional(&self.pool)
        .await?;

        let session = session
            .ok_or_else(|| AuthFlowError::InvalidGrant("Unknown or expired refresh token".to_string()))?;

        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(session.user_id)
            .fetch_optional(&self.pool)
            .await?;
        let user = user.ok_or_else(|| AuthFlowError::InvalidGrant("User no longer exists".to_string()))?;

        sqlx::query("UPDATE user_sessions SET revoked_at = now() WHERE id = $1")
            .bind(session.id)
            .execute(&self.pool)
            .await?;

        info!(user_id = %user.id, session_id = %session.id, "Rotated refresh token");

        self.issue(&user, &session.scope, ctx).await
    }

    /// Revoke one of the user's own sessions. False when the session does not
    /// exist or belongs to someone else.
    pub async fn revoke_session(&self, user_id: Uuid, session_id: Uuid) -> Result<bool, AuthFlowError> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = now() \
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(session_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Keep only the newest `max` active sessions for the user.
    async fn enforce_session_cap(&self, user_id: Uuid, max: i64) -> Result<(), AuthFlowError> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = now() WHERE id IN (\
                 SELECT id FROM user_sessions \
                 WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > now() \
                 ORDER BY created_at DESC OFFSET $2)",
        )
        .bind(user_id)
        .bind(max)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            info!(
                user_id = %user_id,
                revoked = result.rows_affected(),
                "Revoked oldest refresh sessions over the per-user cap"
            );
        }
        Ok(())
    }
}

/// Refresh tokens are opaque; only this hash is persisted.
pub fn hash_refresh_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_token_hash_is_stable_and_hex() {
        let a = hash_refresh_token("token-a");
        let b = hash_refresh_token("token-a");
        let c = hash_refresh_token("token-b");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }
}
