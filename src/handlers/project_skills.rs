use axum::{
    extract::{Extension, Path},
    response::Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::authz::OwnerPolicy;
use crate::database::models::ProjectSkill;
use crate::database::{DatabaseManager, UnitOfWork};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{
    AddSkillToProjectRequest, AuditService, ProjectSkillService, UpdateProjectSkillRequest,
};

/// GET /api/projects/:id/skills
pub async fn list_for_project(
    Extension(_auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
) -> ApiResult<Vec<ProjectSkill>> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool);
    let service = ProjectSkillService::new(&uow, &policy);

    let rows = service.list_for_project(project_id).await?;
    Ok(ApiResponse::success(rows))
}

/// POST /api/projects/:id/skills
pub async fn add_skill(
    Extension(auth): Extension<AuthUser>,
    Path(project_id): Path<Uuid>,
    Json(request): Json<AddSkillToProjectRequest>,
) -> ApiResult<ProjectSkill> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectSkillService::new(&uow, &policy);

    let row = service
        .add_skill_to_project(auth.user_id, project_id, request)
        .await?;

    AuditService::new(pool)
        .record_activity(
            auth.user_id,
            "project_skill.added",
            "project",
            project_id,
            Some(json!({ "skill_id": row.skill_id, "proficiency_level": row.proficiency_level })),
        )
        .await;

    Ok(ApiResponse::created(row))
}

/// PUT /api/projects/:id/skills/:skill_id
pub async fn update_skill(
    Extension(auth): Extension<AuthUser>,
    Path((project_id, skill_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<UpdateProjectSkillRequest>,
) -> ApiResult<ProjectSkill> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectSkillService::new(&uow, &policy);

    let row = service
        .update_project_skill(auth.user_id, project_id, skill_id, request)
        .await?;

    AuditService::new(pool)
        .record_activity(auth.user_id, "project_skill.updated", "project", project_id, None)
        .await;

    Ok(ApiResponse::success(row))
}

/// DELETE /api/projects/:id/skills/:skill_id - composite-key removal
pub async fn remove_skill(
    Extension(auth): Extension<AuthUser>,
    Path((project_id, skill_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<serde_json::Value> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());
    let policy = OwnerPolicy::new(pool.clone());
    let service = ProjectSkillService::new(&uow, &policy);

    if !service
        .remove_skill_from_project(auth.user_id, project_id, skill_id)
        .await?
    {
        return Err(ApiError::not_found("Skill is not attached to this project"));
    }

    AuditService::new(pool)
        .record_activity(auth.user_id, "project_skill.removed", "project", project_id, None)
        .await;

    Ok(ApiResponse::success(json!({ "deleted": true })))
}
