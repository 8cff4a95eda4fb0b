use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Registered OAuth client. Public PKCE clients carry no secret hash.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OAuthClient {
    pub id: Uuid,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret_hash: Option<String>,
    pub display_name: String,
    pub redirect_uris: Vec<String>,
    pub allowed_scopes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub disabled_at: Option<DateTime<Utc>>,
}

impl OAuthClient {
    pub fn is_active(&self) -> bool {
        self.disabled_at.is_none()
    }

    pub fn allows_redirect(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|u| u == uri)
    }

    /// Every requested scope must be registered for the client.
    pub fn allows_scopes<'a>(&self, requested: impl IntoIterator<Item = &'a str>) -> bool {
        requested
            .into_iter()
            .all(|s| self.allowed_scopes.iter().any(|a| a == s))
    }
}

/// Per-user consent grant for a client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserConsent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub granted_scopes: Vec<String>,
    pub granted_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Ad hoc permission grant, optionally expiring.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserPermission {
    pub id: Uuid,
    pub user_id: Uuid,
    pub permission: String,
    pub granted_by: Option<Uuid>,
    pub granted_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Catalog entry describing a grantable scope.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScopeDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(scopes: &[&str], uris: &[&str]) -> OAuthClient {
        OAuthClient {
            id: Uuid::new_v4(),
            client_id: "web".to_string(),
            client_secret_hash: None,
            display_name: "Web".to_string(),
            redirect_uris: uris.iter().map(|s| s.to_string()).collect(),
            allowed_scopes: scopes.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
            disabled_at: None,
        }
    }

    #[test]
    fn scope_subset_check() {
        let c = client(&["openid", "profile", "portfolio"], &[]);
        assert!(c.allows_scopes(["openid", "portfolio"]));
        assert!(!c.allows_scopes(["openid", "admin"]));
    }

    #[test]
    fn redirect_uri_must_be_registered() {
        let c = client(&[], &["https://app.example.com/callback"]);
        assert!(c.allows_redirect("https://app.example.com/callback"));
        assert!(!c.allows_redirect("https://evil.example.com/callback"));
    }
}
