pub mod auth;
pub mod rate_limit;
pub mod response;
pub mod security_headers;
pub mod suspicious;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use rate_limit::{rate_limit_middleware, FixedWindowLimiter, RatePolicy};
pub use response::{ApiResponse, ApiResult};
pub use security_headers::security_headers_middleware;
pub use suspicious::suspicious_request_middleware;

use axum::extract::{ConnectInfo, Request};
use std::net::SocketAddr;

/// Best-effort client address: first hop of x-forwarded-for, else the socket
/// peer address.
pub fn client_ip(request: &Request) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
