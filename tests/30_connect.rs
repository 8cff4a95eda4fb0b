mod common;

use anyhow::Result;
use reqwest::StatusCode;

/// The auth route group runs under the 10/min fixed-window policy. Bad grants
/// come back 400 until the window fills, then 429 with the fixed text body.
#[tokio::test]
async fn token_endpoint_is_rate_limited_with_fixed_body() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let mut saw_bad_request = false;
    let mut rate_limited_body = None;

    for _ in 0..12 {
        let res = client
            .post(format!("{}/connect/token", server.base_url))
            .form(&[("grant_type", "authorization_code"), ("code", "bogus")])
            .send()
            .await?;

        match res.status() {
            StatusCode::BAD_REQUEST => {
                saw_bad_request = true;
            }
            StatusCode::TOO_MANY_REQUESTS => {
                rate_limited_body = Some(res.text().await?);
            }
            other => panic!("unexpected status: {}", other),
        }
    }

    assert!(saw_bad_request, "expected invalid grants before the limit");
    assert_eq!(
        rate_limited_body.as_deref(),
        Some("Rate limit exceeded. Please try again later."),
        "expected the fixed 429 body once the window filled"
    );
    Ok(())
}

#[tokio::test]
async fn userinfo_requires_a_valid_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/connect/userinfo", server.base_url))
        .bearer_auth("not-a-real-token")
        .send()
        .await?;

    // Either rejected outright, or rate limited when the sibling test has
    // already filled this window.
    assert!(
        res.status() == StatusCode::UNAUTHORIZED || res.status() == StatusCode::TOO_MANY_REQUESTS,
        "unexpected status: {}",
        res.status()
    );
    Ok(())
}
