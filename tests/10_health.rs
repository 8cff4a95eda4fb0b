mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn service_info_responds() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(format!("{}/", server.base_url)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Folio API");
    Ok(())
}

#[tokio::test]
async fn db_health_is_connected_or_problem_details() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health/db", server.base_url))
        .send()
        .await?;
    let status = res.status();
    let body = res.json::<serde_json::Value>().await?;

    match status {
        StatusCode::OK => {
            // Reachable database: connection info is reported.
            assert_eq!(body["Status"], "Connected");
            assert!(body["Host"].is_string());
            assert!(body["Database"].is_string());
        }
        StatusCode::INTERNAL_SERVER_ERROR => {
            // Unreachable database: problem-details shaped body.
            assert_eq!(body["error"], true);
            assert_eq!(body["status"], 500);
            assert_eq!(body["code"], "INTERNAL_SERVER_ERROR");
        }
        other => panic!("unexpected status: {}", other),
    }
    Ok(())
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/portfolios", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}
