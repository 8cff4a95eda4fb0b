use axum::{
    extract::Request,
    http::{header::HeaderName, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};

use crate::config;

const CSP: &str = "default-src 'self'; frame-ancestors 'none'; base-uri 'self'";
const PERMISSIONS_POLICY: &str = "camera=(), microphone=(), geolocation=()";
const HSTS: &str = "max-age=31536000; includeSubDomains";

/// Apply the fixed response-header set, skipping any header a handler already
/// set, and strip server-identifying headers.
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_security_headers(response.headers_mut(), config::config().security.require_https);
    response
}

pub fn apply_security_headers(headers: &mut HeaderMap, hsts: bool) {
    headers.remove("server");
    headers.remove("x-powered-by");

    set_if_absent(headers, "x-frame-options", "DENY");
    set_if_absent(headers, "x-content-type-options", "nosniff");
    set_if_absent(headers, "content-security-policy", CSP);
    set_if_absent(headers, "referrer-policy", "strict-origin-when-cross-origin");
    set_if_absent(headers, "permissions-policy", PERMISSIONS_POLICY);
    set_if_absent(headers, "cross-origin-opener-policy", "same-origin");
    set_if_absent(headers, "cross-origin-resource-policy", "same-origin");

    if hsts {
        set_if_absent(headers, "strict-transport-security", HSTS);
    }
}

fn set_if_absent(headers: &mut HeaderMap, name: &'static str, value: &'static str) {
    let name = HeaderName::from_static(name);
    if !headers.contains_key(&name) {
        headers.insert(name, HeaderValue::from_static(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_the_fixed_header_set() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, false);
        assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
        assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
        assert!(headers.contains_key("content-security-policy"));
        assert!(headers.contains_key("referrer-policy"));
        assert!(headers.contains_key("permissions-policy"));
        assert!(headers.contains_key("cross-origin-opener-policy"));
        assert!(!headers.contains_key("strict-transport-security"));
    }

    #[test]
    fn hsts_only_when_https_required() {
        let mut headers = HeaderMap::new();
        apply_security_headers(&mut headers, true);
        assert!(headers.contains_key("strict-transport-security"));
    }

    #[test]
    fn existing_headers_are_not_overwritten() {
        let mut headers = HeaderMap::new();
        headers.insert("x-frame-options", HeaderValue::from_static("SAMEORIGIN"));
        apply_security_headers(&mut headers, false);
        assert_eq!(headers.get("x-frame-options").unwrap(), "SAMEORIGIN");
    }

    #[test]
    fn server_identifying_headers_are_removed() {
        let mut headers = HeaderMap::new();
        headers.insert("server", HeaderValue::from_static("axum"));
        headers.insert("x-powered-by", HeaderValue::from_static("rust"));
        apply_security_headers(&mut headers, false);
        assert!(!headers.contains_key("server"));
        assert!(!headers.contains_key("x-powered-by"));
    }

    #[tokio::test]
    async fn middleware_applies_headers_through_the_router() {
        use axum::{body::Body, http::Request, routing::get, Router};
        use tower::ServiceExt;

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(axum::middleware::from_fn(security_headers_middleware));

        let res = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(res.headers().get("x-frame-options").unwrap(), "DENY");
        assert_eq!(res.headers().get("x-content-type-options").unwrap(), "nosniff");
    }
}
