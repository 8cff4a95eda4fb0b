use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Application user record. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Refresh-token session. The opaque refresh token is stored only as a
/// SHA-256 hash; a row is dead once `revoked_at` is set or `expires_at`
/// passes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserSession {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub refresh_token_hash: String,
    pub scope: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_seen_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl UserSession {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration, revoked: bool) -> UserSession {
        let now = Utc::now();
        UserSession {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            refresh_token_hash: "abc".to_string(),
            scope: "openid".to_string(),
            user_agent: None,
            ip_address: None,
            created_at: now,
            expires_at: now + expires_in,
            last_seen_at: now,
            revoked_at: revoked.then_some(now),
        }
    }

    #[test]
    fn session_activity_window() {
        let now = Utc::now();
        assert!(session(Duration::days(7), false).is_active(now));
        assert!(!session(Duration::days(7), true).is_active(now));
        assert!(!session(Duration::seconds(-1), false).is_active(now));
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            password_hash: "secret".to_string(),
            display_name: "A".to_string(),
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret"));
    }
}
