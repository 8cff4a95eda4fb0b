use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::config;
use crate::middleware::client_ip;

/// Body sent with every 429.
pub const RATE_LIMIT_BODY: &str = "Rate limit exceeded. Please try again later.";

/// A named fixed-window admission policy.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    pub name: &'static str,
    pub limit: u32,
    pub window: Duration,
}

impl RatePolicy {
    pub fn per_minute(name: &'static str, limit: u32) -> Self {
        Self {
            name,
            limit,
            window: Duration::from_secs(60),
        }
    }
}

/// Policy table for the application, built from configuration: one global
/// limiter plus named policies applied per route group. `external_auth`
/// stays configured for external identity callbacks.
pub struct RatePolicies;

impl RatePolicies {
    pub fn global() -> RatePolicy {
        RatePolicy::per_minute("global", config::config().rate_limit.global_per_minute)
    }

    pub fn api() -> RatePolicy {
        RatePolicy::per_minute("api", config::config().rate_limit.api_per_minute)
    }

    pub fn auth() -> RatePolicy {
        RatePolicy::per_minute("auth", config::config().rate_limit.auth_per_minute)
    }

    pub fn external_auth() -> RatePolicy {
        RatePolicy::per_minute(
            "external_auth",
            config::config().rate_limit.external_auth_per_minute,
        )
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter keyed by caller identity (client IP).
/// Windows do not overlap: the first request after a window elapses starts a
/// fresh one. Shared process-wide; counts are updated under a mutex.
pub struct FixedWindowLimiter {
    policy: RatePolicy,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowLimiter {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> &RatePolicy {
        &self.policy
    }

    /// Count a request against the key's current window. True = admitted.
    pub fn check(&self, key: &str) -> bool {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> bool {
        let mut windows = self.windows.lock().expect("limiter poisoned");

        // Opportunistic sweep so idle keys don't accumulate forever.
        if windows.len() > 10_000 {
            let window = self.policy.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(entry.started) >= self.policy.window {
            entry.started = now;
            entry.count = 0;
        }

        entry.count += 1;
        entry.count <= self.policy.limit
    }
}

/// Admission middleware. On exceedance: 429 with a fixed text body.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !config::config().rate_limit.enabled {
        return next.run(request).await;
    }

    let key = client_ip(&request);
    if limiter.check(&key) {
        next.run(request).await
    } else {
        warn!(
            policy = limiter.policy().name,
            client = %key,
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        (StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_BODY).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(limit: u32, window_secs: u64) -> FixedWindowLimiter {
        FixedWindowLimiter::new(RatePolicy {
            name: "test",
            limit,
            window: Duration::from_secs(window_secs),
        })
    }

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(!limiter.check_at("1.2.3.4", now));
    }

    #[test]
    fn windows_are_per_key() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at("1.2.3.4", now));
        assert!(limiter.check_at("5.6.7.8", now));
        assert!(!limiter.check_at("1.2.3.4", now));
    }

    #[test]
    fn fresh_window_resets_the_count() {
        let limiter = limiter(2, 60);
        let now = Instant::now();
        assert!(limiter.check_at("k", now));
        assert!(limiter.check_at("k", now));
        assert!(!limiter.check_at("k", now));

        let later = now + Duration::from_secs(60);
        assert!(limiter.check_at("k", later));
    }

    #[test]
    fn requests_inside_window_do_not_slide_it() {
        let limiter = limiter(100, 60);
        let start = Instant::now();
        assert!(limiter.check_at("k", start));
        // 59s in, same window.
        assert!(limiter.check_at("k", start + Duration::from_secs(59)));
        // 61s after the window STARTED (not after the last request) resets.
        let windows = limiter.windows.lock().unwrap();
        assert_eq!(windows.get("k").unwrap().count, 2);
    }

    #[tokio::test]
    async fn middleware_answers_429_with_the_fixed_body() {
        use axum::{body::Body, http::Request, routing::get, Router};
        use std::sync::Arc;
        use tower::ServiceExt;

        let limiter = Arc::new(limiter(1, 60));
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn_with_state(limiter, rate_limit_middleware));

        let first = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], RATE_LIMIT_BODY.as_bytes());
    }
}
