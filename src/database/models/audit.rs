use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Append-only record of an authentication event (login, token issue,
/// refresh, revocation). User reference is nullable so client-only failures
/// can still be recorded.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AuthenticationAuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub event_type: String,
    pub success: bool,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub detail: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a rejected credential check.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FailedLoginAttempt {
    pub id: Uuid,
    pub email: String,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a domain mutation performed by a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserActivityAuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub activity: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<Uuid>,
    pub detail: Option<Value>,
    pub created_at: DateTime<Utc>,
}

/// Append-only record of a security-relevant observation (e.g. a request
/// matching the suspicious-pattern blocklist).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SecurityAuditLog {
    pub id: Uuid,
    pub event_type: String,
    pub severity: String,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub detail: Option<Value>,
    pub created_at: DateTime<Utc>,
}
