use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::database::models::Skill;
use crate::database::{DatabaseManager, UnitOfWork};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{AuditService, CreateSkillRequest, SkillService, UpdateSkillRequest};

/// GET /api/skills
pub async fn list_skills() -> ApiResult<Vec<Skill>> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool);
    let service = SkillService::new(&uow);

    let skills = service.list_skills().await?;
    Ok(ApiResponse::success(skills))
}

/// GET /api/skills/:id
pub async fn get_skill(Path(id): Path<Uuid>) -> ApiResult<Skill> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool);
    let service = SkillService::new(&uow);

    match service.get_skill(id).await? {
        Some(skill) => Ok(ApiResponse::success(skill)),
        None => Err(ApiError::not_found("Skill not found")),
    }
}

/// POST /api/skills
pub async fn create_skill(
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateSkillRequest>,
) -> ApiResult<Skill> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let service = SkillService::new(&uow);

    let skill = service.create_skill(request).await?;

    AuditService::new(pool)
        .record_activity(
            auth.user_id,
            "skill.created",
            "skill",
            skill.id,
            Some(json!({ "name": skill.name })),
        )
        .await;

    Ok(ApiResponse::created(skill))
}

/// PUT /api/skills/:id
pub async fn update_skill(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSkillRequest>,
) -> ApiResult<Skill> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let service = SkillService::new(&uow);

    let skill = service.update_skill(id, request).await?;

    AuditService::new(pool)
        .record_activity(auth.user_id, "skill.updated", "skill", id, None)
        .await;

    Ok(ApiResponse::success(skill))
}

/// DELETE /api/skills/:id
pub async fn delete_skill(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let service = SkillService::new(&uow);

    if !service.delete_skill(id).await? {
        return Err(ApiError::not_found("Skill not found"));
    }

    AuditService::new(pool)
        .record_activity(auth.user_id, "skill.deleted", "skill", id, None)
        .await;

    Ok(ApiResponse::success(json!({ "deleted": true })))
}
