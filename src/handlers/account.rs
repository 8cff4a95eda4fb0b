use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::auth::token_service::TokenService;
use crate::authz::{AccessPolicy, OwnerPolicy};
use crate::database::models::{User, UserConsent, UserSession};
use crate::database::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::AccountService;

/// GET /api/auth/me
pub async fn me(Extension(auth): Extension<AuthUser>) -> ApiResult<User> {
    let pool = DatabaseManager::pool().await?;
    let user = AccountService::new(pool)
        .get_profile(auth.user_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    Ok(ApiResponse::success(user))
}

/// GET /api/auth/sessions - the caller's active refresh sessions
pub async fn list_sessions(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<UserSession>> {
    let pool = DatabaseManager::pool().await?;
    let sessions = AccountService::new(pool)
        .list_sessions(auth.user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(ApiResponse::success(sessions))
}

/// DELETE /api/auth/sessions/:id - revoke one of the caller's sessions
pub async fn revoke_session(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let revoked = TokenService::new(pool)
        .revoke_session(auth.user_id, id)
        .await
        .map_err(ApiError::from)?;

    if !revoked {
        return Err(ApiError::not_found("Session not found"));
    }
    Ok(ApiResponse::success(json!({ "revoked": true })))
}

/// GET /api/auth/consents - the caller's active consent grants
pub async fn list_consents(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<UserConsent>> {
    let pool = DatabaseManager::pool().await?;
    let consents = AccountService::new(pool)
        .list_consents(auth.user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(ApiResponse::success(consents))
}

/// DELETE /api/auth/consents/:id - revoke one of the caller's consent grants
pub async fn revoke_consent(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let revoked = AccountService::new(pool)
        .revoke_consent(auth.user_id, id)
        .await
        .map_err(ApiError::from)?;

    if !revoked {
        return Err(ApiError::not_found("Consent not found"));
    }
    Ok(ApiResponse::success(json!({ "revoked": true })))
}

/// GET /api/auth/activity - the caller's recent account history: sign-ins,
/// failed attempts against their email, and domain mutations.
pub async fn activity(Extension(auth): Extension<AuthUser>) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let accounts = AccountService::new(pool);

    let authentication = accounts
        .list_recent_auth_events(auth.user_id)
        .await
        .map_err(ApiError::from)?;
    let failed_logins = accounts
        .list_recent_failed_logins(&auth.email)
        .await
        .map_err(ApiError::from)?;
    let activity = accounts
        .list_recent_activity(auth.user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(ApiResponse::success(json!({
        "authentication": authentication,
        "failed_logins": failed_logins,
        "activity": activity,
    })))
}

/// GET /api/auth/security-events - service-wide security observations,
/// restricted to holders of the audit-view permission.
pub async fn security_events(
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<crate::database::models::SecurityAuditLog>> {
    let pool = DatabaseManager::pool().await?;

    let policy = OwnerPolicy::new(pool.clone());
    if !policy
        .can_view_audit_events(auth.user_id)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::forbidden("You do not have access to audit events"));
    }

    let events = AccountService::new(pool)
        .list_security_events()
        .await
        .map_err(ApiError::from)?;
    Ok(ApiResponse::success(events))
}
