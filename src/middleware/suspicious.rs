use axum::{extract::Request, middleware::Next, response::Response};
use serde_json::json;
use tracing::warn;

use crate::config;
use crate::database::DatabaseManager;
use crate::middleware::client_ip;
use crate::services::AuditService;

/// Substrings that mark a request as worth logging. Detection only; nothing
/// is blocked here.
const SUSPICIOUS_PATTERNS: &[&str] = &[
    "<script",
    "javascript:",
    "onerror=",
    "../",
    "..\\",
    "%2e%2e",
    "union select",
    "select * from",
    "insert into",
    "drop table",
    "delete from",
    "xp_cmdshell",
    "etc/passwd",
];

/// First blocklist entry found in the path, query or user-agent, if any.
pub fn find_suspicious(path: &str, query: &str, user_agent: &str) -> Option<&'static str> {
    let haystacks = [
        path.to_lowercase(),
        query.to_lowercase(),
        user_agent.to_lowercase(),
    ];
    SUSPICIOUS_PATTERNS
        .iter()
        .find(|pattern| haystacks.iter().any(|h| h.contains(*pattern)))
        .copied()
}

/// Log-only inspection of incoming requests against the blocklist.
pub async fn suspicious_request_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let query = request.uri().query().unwrap_or("").to_string();
    let user_agent = request
        .headers()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if let Some(pattern) = find_suspicious(&path, &query, &user_agent) {
        let client = client_ip(&request);
        warn!(
            client = %client,
            %path,
            matched = pattern,
            "Suspicious request pattern detected"
        );

        // Best-effort audit trail; the request itself is never blocked.
        if config::config().security.enable_audit_logging {
            if let Ok(pool) = DatabaseManager::pool().await {
                AuditService::new(pool)
                    .record_security_event(
                        "suspicious_request",
                        "warning",
                        Some(&client),
                        Some(json!({ "path": path, "pattern": pattern })),
                    )
                    .await;
            }
        }
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_script_injection() {
        assert_eq!(find_suspicious("/", "q=<SCRIPT>alert(1)</script>", ""), Some("<script"));
    }

    #[test]
    fn flags_path_traversal() {
        assert_eq!(find_suspicious("/api/../etc/passwd", "", ""), Some("../"));
    }

    #[test]
    fn flags_sql_keywords_in_user_agent() {
        assert_eq!(find_suspicious("/", "", "UNION SELECT password"), Some("union select"));
    }

    #[test]
    fn clean_request_passes() {
        assert_eq!(find_suspicious("/api/portfolios", "sort=created_at", "Mozilla/5.0"), None);
    }
}
