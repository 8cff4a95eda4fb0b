pub mod account;
pub mod connect;
pub mod health;
pub mod portfolios;
pub mod project_skills;
pub mod projects;
pub mod public;
pub mod skills;

use axum::http::HeaderMap;

use crate::auth::token_service::RequestContext;

/// Client metadata for session records and audit rows, taken from headers.
pub fn request_context(headers: &HeaderMap) -> RequestContext {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    RequestContext {
        ip_address,
        user_agent,
    }
}
