use chrono::Utc;
use serde_json::Value;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::auth::token_service::RequestContext;
use crate::config;

/// Append-only audit writer. Every method is best-effort: a failed insert is
/// logged and swallowed so auditing can never fail the request it describes.
/// All writes are gated on `security.enable_audit_logging`.
pub struct AuditService {
    pool: PgPool,
}

impl AuditService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn enabled(&self) -> bool {
        config::config().security.enable_audit_logging
    }

    pub async fn record_authentication(
        &self,
        user_id: Option<Uuid>,
        event_type: &str,
        success: bool,
        ctx: &RequestContext,
        detail: Option<Value>,
    ) {
        if !self.enabled() {
            return;
        }
        let result = sqlx::query(
            "INSERT INTO authentication_audit_log \
             (id, user_id, event_type, success, ip_address, user_agent, detail, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(event_type)
        .bind(success)
        .bind(&ctx.ip_address)
        .bind(&ctx.user_agent)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(event_type, "Failed to record authentication audit event: {}", e);
        }
    }

    pub async fn record_failed_login(
        &self,
        email: &str,
        user_id: Option<Uuid>,
        ip_address: Option<&str>,
        reason: &str,
    ) {
        if !self.enabled() {
            return;
        }
        let result = sqlx::query(
            "INSERT INTO failed_login_attempts (id, email, user_id, ip_address, reason, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(user_id)
        .bind(ip_address)
        .bind(reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!("Failed to record failed login attempt: {}", e);
        }
    }

    pub async fn record_activity(
        &self,
        user_id: Uuid,
        activity: &str,
        resource_type: &str,
        resource_id: Uuid,
        detail: Option<Value>,
    ) {
        if !self.enabled() {
            return;
        }
        let result = sqlx::query(
            "INSERT INTO user_activity_audit_log \
             (id, user_id, activity, resource_type, resource_id, detail, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(activity)
        .bind(resource_type)
        .bind(resource_id)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(activity, "Failed to record activity audit event: {}", e);
        }
    }

    pub async fn record_security_event(
        &self,
        event_type: &str,
        severity: &str,
        ip_address: Option<&str>,
        detail: Option<Value>,
    ) {
        if !self.enabled() {
            return;
        }
        let result = sqlx::query(
            "INSERT INTO security_audit_log (id, event_type, severity, ip_address, detail, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::new_v4())
        .bind(event_type)
        .bind(severity)
        .bind(ip_address)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(event_type, "Failed to record security audit event: {}", e);
        }
    }
}
