use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::authz::AccessPolicy;
use crate::database::models::project_skill::{MAX_PROFICIENCY, MIN_PROFICIENCY};
use crate::database::models::ProjectSkill;
use crate::database::UnitOfWork;
use crate::services::ServiceError;

#[derive(Debug, Clone, Deserialize)]
pub struct AddSkillToProjectRequest {
    pub skill_id: Uuid,
    pub proficiency_level: i16,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectSkillRequest {
    pub proficiency_level: i16,
    #[serde(default)]
    pub is_primary: bool,
}

/// Manages the project/skill association rows, keyed by the composite
/// (project_id, skill_id) pair throughout.
pub struct ProjectSkillService<'a> {
    uow: &'a UnitOfWork,
    policy: &'a dyn AccessPolicy,
}

impl<'a> ProjectSkillService<'a> {
    pub fn new(uow: &'a UnitOfWork, policy: &'a dyn AccessPolicy) -> Self {
        Self { uow, policy }
    }

    pub async fn add_skill_to_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: AddSkillToProjectRequest,
    ) -> Result<ProjectSkill, ServiceError> {
        debug!(project_id = %project_id, skill_id = %request.skill_id, "Attaching skill to project");
        validate_proficiency(request.proficiency_level)?;

        if self.uow.projects().get_by_id(project_id).await?.is_none() {
            return Err(ServiceError::NotFound("Project not found".to_string()));
        }
        if self.uow.skills().get_by_id(request.skill_id).await?.is_none() {
            return Err(ServiceError::NotFound("Skill not found".to_string()));
        }

        if !self.policy.can_manage_project(user_id, project_id).await? {
            warn!(project_id = %project_id, user_id = %user_id, "Rejected skill attach: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this project".to_string(),
            ));
        }

        if self
            .uow
            .project_skills()
            .get_by_key(project_id, request.skill_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Validation(
                "This skill is already attached to the project".to_string(),
            ));
        }

        let row = ProjectSkill {
            project_id,
            skill_id: request.skill_id,
            proficiency_level: request.proficiency_level,
            is_primary: request.is_primary,
            created_at: Utc::now(),
        };

        self.uow.project_skills().add(row.clone());
        self.uow.commit().await?;

        info!(project_id = %project_id, skill_id = %row.skill_id, "Attached skill to project");
        Ok(row)
    }

    pub async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<ProjectSkill>, ServiceError> {
        Ok(self.uow.project_skills().list_for_project(project_id).await?)
    }

    pub async fn update_project_skill(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        skill_id: Uuid,
        request: UpdateProjectSkillRequest,
    ) -> Result<ProjectSkill, ServiceError> {
        debug!(project_id = %project_id, skill_id = %skill_id, "Updating project skill");
        validate_proficiency(request.proficiency_level)?;

        let mut row = self
            .uow
            .project_skills()
            .get_by_key(project_id, skill_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Skill is not attached to this project".to_string()))?;

        if !self.policy.can_manage_project(user_id, project_id).await? {
            warn!(project_id = %project_id, user_id = %user_id, "Rejected skill update: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this project".to_string(),
            ));
        }

        row.proficiency_level = request.proficiency_level;
        row.is_primary = request.is_primary;

        self.uow.project_skills().update(row.clone());
        self.uow.commit().await?;

        info!(project_id = %project_id, skill_id = %skill_id, "Updated project skill");
        Ok(row)
    }

    /// Detach a skill by its composite key. A missing pair answers false.
    pub async fn remove_skill_from_project(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        skill_id: Uuid,
    ) -> Result<bool, ServiceError> {
        debug!(project_id = %project_id, skill_id = %skill_id, "Detaching skill from project");
        if self
            .uow
            .project_skills()
            .get_by_key(project_id, skill_id)
            .await?
            .is_none()
        {
            return Ok(false);
        }

        if !self.policy.can_manage_project(user_id, project_id).await? {
            warn!(project_id = %project_id, user_id = %user_id, "Rejected skill detach: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this project".to_string(),
            ));
        }

        self.uow
            .project_skills()
            .delete_by_key(project_id, skill_id)
            .await?;
        self.uow.commit().await?;

        info!(project_id = %project_id, skill_id = %skill_id, "Detached skill from project");
        Ok(true)
    }
}

fn validate_proficiency(level: i16) -> Result<(), ServiceError> {
    if !(MIN_PROFICIENCY..=MAX_PROFICIENCY).contains(&level) {
        return Err(ServiceError::Validation(format!(
            "Proficiency level must be between {} and {}",
            MIN_PROFICIENCY, MAX_PROFICIENCY
        )));
    }
    Ok(())
}
