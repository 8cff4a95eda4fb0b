use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::config;

/// Everything the token endpoint needs to redeem an authorization code.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub user_id: Uuid,
    pub client_id: Uuid,
    pub client_public_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub code_challenge: String,
    pub expires_at: DateTime<Utc>,
}

/// In-process store of single-use authorization codes. Codes are short-lived
/// objects; expired entries are swept on every access.
pub struct AuthorizationCodeStore {
    codes: Mutex<HashMap<String, PendingAuthorization>>,
}

impl AuthorizationCodeStore {
    pub fn new() -> Self {
        Self {
            codes: Mutex::new(HashMap::new()),
        }
    }

    pub fn instance() -> &'static AuthorizationCodeStore {
        use std::sync::OnceLock;
        static INSTANCE: OnceLock<AuthorizationCodeStore> = OnceLock::new();
        INSTANCE.get_or_init(AuthorizationCodeStore::new)
    }

    /// Store a pending authorization under a fresh opaque code.
    pub fn issue(&self, mut pending: PendingAuthorization) -> String {
        let ttl = config::config().auth.auth_code_ttl_secs;
        pending.expires_at = Utc::now() + Duration::seconds(ttl);
        self.issue_at(pending, Utc::now())
    }

    fn issue_at(&self, pending: PendingAuthorization, now: DateTime<Utc>) -> String {
        let code = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        let mut codes = self.codes.lock().expect("code store poisoned");
        codes.retain(|_, p| p.expires_at > now);
        codes.insert(code.clone(), pending);
        code
    }

    /// Redeem a code. Removal is unconditional: a code can be used once,
    /// whether or not the rest of the token request then succeeds.
    pub fn take(&self, code: &str) -> Option<PendingAuthorization> {
        self.take_at(code, Utc::now())
    }

    fn take_at(&self, code: &str, now: DateTime<Utc>) -> Option<PendingAuthorization> {
        let mut codes = self.codes.lock().expect("code store poisoned");
        codes.retain(|_, p| p.expires_at > now);
        codes.remove(code)
    }
}

impl Default for AuthorizationCodeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(expires_at: DateTime<Utc>) -> PendingAuthorization {
        PendingAuthorization {
            user_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            client_public_id: "web".to_string(),
            redirect_uri: "https://app.example.com/callback".to_string(),
            scope: "openid".to_string(),
            code_challenge: "challenge".to_string(),
            expires_at,
        }
    }

    #[test]
    fn codes_are_single_use() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        let code = store.issue_at(pending(now + Duration::minutes(10)), now);

        assert!(store.take_at(&code, now).is_some());
        assert!(store.take_at(&code, now).is_none());
    }

    #[test]
    fn expired_codes_are_gone() {
        let store = AuthorizationCodeStore::new();
        let now = Utc::now();
        let code = store.issue_at(pending(now + Duration::minutes(10)), now);

        assert!(store.take_at(&code, now + Duration::minutes(11)).is_none());
    }

    #[test]
    fn unknown_code_is_none() {
        let store = AuthorizationCodeStore::new();
        assert!(store.take_at("nope", Utc::now()).is_none());
    }
}
