use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::authz::OwnerPolicy;
use crate::database::models::Project;
use crate::database::{DatabaseManager, UnitOfWork};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{AuditService, CreateProjectRequest, ProjectService, UpdateProjectRequest};

/// GET /api/portfolios/:id/projects
pub async fn list_for_portfolio(
    Extension(auth): Extension<AuthUser>,
    Path(portfolio_id): Path<Uuid>,
) -> ApiResult<Vec<Project>> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool);
    let service = ProjectService::new(&uow, &policy);

    // Listing follows the portfolio's visibility rules.
    let portfolio = uow
        .portfolios()
        .get_by_id(portfolio_id)
        .await
        .map_err(ApiError::from)?;
    match portfolio {
        Some(p) if p.user_id == auth.user_id || p.is_public => {}
        _ => return Err(ApiError::not_found("Portfolio not found")),
    }

    let projects = service.list_for_portfolio(portfolio_id).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/projects/:id
pub async fn get_project(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Project> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool);
    let service = ProjectService::new(&uow, &policy);

    let project = service
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let portfolio = uow
        .portfolios()
        .get_by_id(project.portfolio_id)
        .await
        .map_err(ApiError::from)?;
    match portfolio {
        Some(p) if p.user_id == auth.user_id || p.is_public => Ok(ApiResponse::success(project)),
        _ => Err(ApiError::not_found("Project not found")),
    }
}

/// POST /api/projects
pub async fn create_project(
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<Project> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectService::new(&uow, &policy);

    let project = service.create_project(auth.user_id, request).await?;

    AuditService::new(pool)
        .record_activity(
            auth.user_id,
            "project.created",
            "project",
            project.id,
            Some(json!({ "portfolio_id": project.portfolio_id, "title": project.title })),
        )
        .await;

    Ok(ApiResponse::created(project))
}

/// PUT /api/projects/:id
pub async fn update_project(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Project> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectService::new(&uow, &policy);

    let project = service.update_project(auth.user_id, id, request).await?;

    AuditService::new(pool)
        .record_activity(auth.user_id, "project.updated", "project", id, None)
        .await;

    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectService::new(&uow, &policy);

    if !service.delete_project(auth.user_id, id).await? {
        return Err(ApiError::not_found("Project not found"));
    }

    AuditService::new(pool)
        .record_activity(auth.user_id, "project.deleted", "project", id, None)
        .await;

    Ok(ApiResponse::success(json!({ "deleted": true })))
}
