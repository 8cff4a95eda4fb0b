use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    AuthenticationAuditLog, FailedLoginAttempt, OAuthClient, ScopeDefinition, SecurityAuditLog,
    User, UserActivityAuditLog, UserConsent, UserSession,
};

/// User-facing account queries: profile, sessions, consents, plus the
/// client/user lookups the authorization endpoint needs.
pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_client(&self, client_id: &str) -> Result<Option<OAuthClient>, DatabaseError> {
        let client = sqlx::query_as::<_, OAuthClient>(
            "SELECT * FROM oauth_clients WHERE client_id = $1 AND disabled_at IS NULL",
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(client)
    }

    /// Active (unrevoked, unexpired) refresh sessions, newest first.
    pub async fn list_sessions(&self, user_id: Uuid) -> Result<Vec<UserSession>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserSession>(
            "SELECT * FROM user_sessions \
             WHERE user_id = $1 AND revoked_at IS NULL AND expires_at > now() \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active consent grants, newest first.
    pub async fn list_consents(&self, user_id: Uuid) -> Result<Vec<UserConsent>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserConsent>(
            "SELECT * FROM user_consents \
             WHERE user_id = $1 AND revoked_at IS NULL \
             ORDER BY granted_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Record (or refresh) the user's consent for a client. One active grant
    /// per (user, client) pair; re-granting replaces the scopes and clears
    /// any prior revocation.
    pub async fn upsert_consent(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        scopes: &[String],
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO user_consents (id, user_id, client_id, granted_scopes, granted_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (user_id, client_id) DO UPDATE \
             SET granted_scopes = EXCLUDED.granted_scopes, granted_at = now(), revoked_at = NULL",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(client_id)
        .bind(scopes)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Revoke one of the user's own consent grants. False when the grant does
    /// not exist, is already revoked, or belongs to someone else.
    pub async fn revoke_consent(&self, user_id: Uuid, consent_id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE user_consents SET revoked_at = now() \
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(consent_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        let revoked = result.rows_affected() > 0;
        if revoked {
            info!(consent_id = %consent_id, user_id = %user_id, "Revoked consent grant");
        }
        Ok(revoked)
    }

    /// The grantable-scope catalog.
    pub async fn list_scope_definitions(&self) -> Result<Vec<ScopeDefinition>, DatabaseError> {
        let rows = sqlx::query_as::<_, ScopeDefinition>("SELECT * FROM scope_definitions ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn list_recent_auth_events(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AuthenticationAuditLog>, DatabaseError> {
        let rows = sqlx::query_as::<_, AuthenticationAuditLog>(
            "SELECT * FROM authentication_audit_log \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_recent_failed_logins(
        &self,
        email: &str,
    ) -> Result<Vec<FailedLoginAttempt>, DatabaseError> {
        let rows = sqlx::query_as::<_, FailedLoginAttempt>(
            "SELECT * FROM failed_login_attempts \
             WHERE lower(email) = lower($1) ORDER BY created_at DESC LIMIT 50",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_recent_activity(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserActivityAuditLog>, DatabaseError> {
        let rows = sqlx::query_as::<_, UserActivityAuditLog>(
            "SELECT * FROM user_activity_audit_log \
             WHERE user_id = $1 ORDER BY created_at DESC LIMIT 50",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Recent security observations across the whole service. Callers gate
    /// this behind the audit-view permission.
    pub async fn list_security_events(&self) -> Result<Vec<SecurityAuditLog>, DatabaseError> {
        let rows = sqlx::query_as::<_, SecurityAuditLog>(
            "SELECT * FROM security_audit_log ORDER BY created_at DESC LIMIT 100",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
