use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::authz::OwnerPolicy;
use crate::database::models::Portfolio;
use crate::database::{DatabaseManager, UnitOfWork};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{AuditService, CreatePortfolioRequest, PortfolioService, UpdatePortfolioRequest};

/// GET /api/portfolios - the caller's portfolios
pub async fn list_portfolios(Extension(auth): Extension<AuthUser>) -> ApiResult<Vec<Portfolio>> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool);
    let service = PortfolioService::new(&uow, &policy);

    let portfolios = service.list_for_user(auth.user_id).await?;
    Ok(ApiResponse::success(portfolios))
}

/// GET /api/portfolios/:id - owner sees everything, others only public
pub async fn get_portfolio(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Portfolio> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool);
    let service = PortfolioService::new(&uow, &policy);

    match service.get_portfolio(id).await? {
        Some(p) if p.user_id == auth.user_id || p.is_public => Ok(ApiResponse::success(p)),
        // Private portfolios of other users are indistinguishable from absent ones.
        _ => Err(ApiError::not_found("Portfolio not found")),
    }
}

/// POST /api/portfolios
pub async fn create_portfolio(
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreatePortfolioRequest>,
) -> ApiResult<Portfolio> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = PortfolioService::new(&uow, &policy);

    let portfolio = service.create_portfolio(auth.user_id, request).await?;

    AuditService::new(pool)
        .record_activity(
            auth.user_id,
            "portfolio.created",
            "portfolio",
            portfolio.id,
            Some(json!({ "title": portfolio.title })),
        )
        .await;

    Ok(ApiResponse::created(portfolio))
}

/// PUT /api/portfolios/:id
pub async fn update_portfolio(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePortfolioRequest>,
) -> ApiResult<Portfolio> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = PortfolioService::new(&uow, &policy);

    let portfolio = service.update_portfolio(auth.user_id, id, request).await?;

    AuditService::new(pool)
        .record_activity(auth.user_id, "portfolio.updated", "portfolio", id, None)
        .await;

    Ok(ApiResponse::success(portfolio))
}

/// DELETE /api/portfolios/:id
pub async fn delete_portfolio(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = PortfolioService::new(&uow, &policy);

    if !service.delete_portfolio(auth.user_id, id).await? {
        return Err(ApiError::not_found("Portfolio not found"));
    }

    AuditService::new(pool)
        .record_activity(auth.user_id, "portfolio.deleted", "portfolio", id, None)
        .await;

    Ok(ApiResponse::success(json!({ "deleted": true })))
}
