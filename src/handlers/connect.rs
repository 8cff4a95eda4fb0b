use axum::{extract::Form, http::HeaderMap, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::code_store::{AuthorizationCodeStore, PendingAuthorization};
use crate::auth::token_service::{IssuedTokens, TokenService};
use crate::auth::{pkce, validate_jwt, AuthFlowError};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::handlers::request_context;
use crate::middleware::auth::extract_bearer_token;
use crate::services::{AccountService, AuditService};

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: Option<String>,
    pub code_challenge: String,
    pub code_challenge_method: String,
    // Resource-owner credentials; there is no separate login UI.
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub grant_type: String,
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
    pub client_id: Option<String>,
    pub refresh_token: Option<String>,
}

/// POST /connect/authorize - authorization-code + PKCE front half.
///
/// Validates the client registration, authenticates the resource owner,
/// records consent and returns a single-use code bound to the S256 challenge.
pub async fn authorize(
    headers: HeaderMap,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let accounts = AccountService::new(pool.clone());
    let audit = AuditService::new(pool);
    let ctx = request_context(&headers);

    let client = accounts
        .find_client(&request.client_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::from(AuthFlowError::InvalidClient("Unknown client".to_string())))?;

    if !client.allows_redirect(&request.redirect_uri) {
        return Err(AuthFlowError::InvalidRequest(
            "redirect_uri is not registered for this client".to_string(),
        )
        .into());
    }

    let scopes: Vec<String> = request
        .scope
        .split_whitespace()
        .map(|s| s.to_string())
        .collect();
    if scopes.is_empty() {
        return Err(AuthFlowError::InvalidScope("At least one scope is required".to_string()).into());
    }
    if !client.allows_scopes(scopes.iter().map(|s| s.as_str())) {
        return Err(AuthFlowError::InvalidScope(
            "Requested scopes exceed the client's registration".to_string(),
        )
        .into());
    }

    // Every requested scope must also exist in the catalog.
    let catalog = accounts.list_scope_definitions().await.map_err(ApiError::from)?;
    for scope in &scopes {
        if !catalog.iter().any(|def| &def.name == scope) {
            return Err(AuthFlowError::InvalidScope(format!("Unknown scope '{}'", scope)).into());
        }
    }

    if request.code_challenge_method != pkce::METHOD_S256 {
        return Err(AuthFlowError::InvalidRequest(
            "code_challenge_method must be S256".to_string(),
        )
        .into());
    }
    if request.code_challenge.is_empty() {
        return Err(AuthFlowError::InvalidRequest("code_challenge is required".to_string()).into());
    }

    let user = accounts
        .find_user_by_email(&request.email)
        .await
        .map_err(ApiError::from)?;
    let user = match user {
        Some(u) if bcrypt::verify(&request.password, &u.password_hash).unwrap_or(false) => u,
        other => {
            audit
                .record_failed_login(
                    &request.email,
                    other.map(|u| u.id),
                    ctx.ip_address.as_deref(),
                    "invalid credentials",
                )
                .await;
            return Err(AuthFlowError::InvalidCredentials.into());
        }
    };

    accounts
        .upsert_consent(user.id, client.id, &scopes)
        .await
        .map_err(ApiError::from)?;

    let code = AuthorizationCodeStore::instance().issue(PendingAuthorization {
        user_id: user.id,
        client_id: client.id,
        client_public_id: client.client_id.clone(),
        redirect_uri: request.redirect_uri.clone(),
        scope: scopes.join(" "),
        code_challenge: request.code_challenge.clone(),
        // Stamped by the store from the configured TTL.
        expires_at: chrono::Utc::now(),
    });

    audit
        .record_authentication(
            Some(user.id),
            "authorize",
            true,
            &ctx,
            Some(json!({ "client_id": client.client_id })),
        )
        .await;

    Ok(Json(json!({
        "code": code,
        "state": request.state,
    })))
}

/// POST /connect/token - code redemption and refresh rotation.
pub async fn token(
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Result<Json<IssuedTokens>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let tokens = TokenService::new(pool.clone());
    let audit = AuditService::new(pool.clone());
    let ctx = request_context(&headers);

    match request.grant_type.as_str() {
        "authorization_code" => {
            let code = request
                .code
                .ok_or_else(|| AuthFlowError::InvalidRequest("code is required".to_string()))
                .map_err(ApiError::from)?;
            let verifier = request
                .code_verifier
                .ok_or_else(|| AuthFlowError::InvalidRequest("code_verifier is required".to_string()))
                .map_err(ApiError::from)?;
            let client_id = request
                .client_id
                .ok_or_else(|| AuthFlowError::InvalidRequest("client_id is required".to_string()))
                .map_err(ApiError::from)?;

            // The code is consumed here whether or not the rest succeeds.
            let pending = AuthorizationCodeStore::instance()
                .take(&code)
                .ok_or_else(|| {
                    AuthFlowError::InvalidGrant("Unknown or expired authorization code".to_string())
                })
                .map_err(ApiError::from)?;

            if pending.client_public_id != client_id {
                return Err(AuthFlowError::InvalidGrant(
                    "Authorization code was issued to a different client".to_string(),
                )
                .into());
            }
            if request.redirect_uri.as_deref() != Some(pending.redirect_uri.as_str()) {
                return Err(AuthFlowError::InvalidGrant(
                    "redirect_uri does not match the authorization request".to_string(),
                )
                .into());
            }
            if !pkce::verify(&verifier, &pending.code_challenge) {
                audit
                    .record_authentication(Some(pending.user_id), "token.pkce_failed", false, &ctx, None)
                    .await;
                return Err(AuthFlowError::InvalidGrant("PKCE verification failed".to_string()).into());
            }

            let user = AccountService::new(pool)
                .get_profile(pending.user_id)
                .await
                .map_err(ApiError::from)?
                .ok_or_else(|| AuthFlowError::InvalidGrant("User no longer exists".to_string()))
                .map_err(ApiError::from)?;

            let issued = tokens.issue(&user, &pending.scope, &ctx).await.map_err(ApiError::from)?;
            audit
                .record_authentication(Some(user.id), "token.issued", true, &ctx, None)
                .await;
            Ok(Json(issued))
        }
        "refresh_token" => {
            let refresh_token = request
                .refresh_token
                .ok_or_else(|| AuthFlowError::InvalidRequest("refresh_token is required".to_string()))
                .map_err(ApiError::from)?;

            let issued = tokens.refresh(&refresh_token, &ctx).await.map_err(ApiError::from)?;
            audit
                .record_authentication(None, "token.refreshed", true, &ctx, None)
                .await;
            Ok(Json(issued))
        }
        other => Err(ApiError::bad_request(format!("Unsupported grant_type '{}'", other))),
    }
}

/// GET /connect/userinfo - profile claims for a bearer access token.
pub async fn userinfo(headers: HeaderMap) -> Result<Json<Value>, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;
    let claims = validate_jwt(&token).map_err(ApiError::unauthorized)?;

    let pool = DatabaseManager::pool().await?;
    let user = AccountService::new(pool)
        .get_profile(claims.sub)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;

    Ok(Json(json!({
        "sub": user.id,
        "email": user.email,
        "name": user.display_name,
        "bio": user.bio,
        "picture": user.avatar_url,
        "scope": claims.scope,
    })))
}
