use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::models::Skill;
use crate::database::UnitOfWork;
use crate::services::{validate_optional_text, validate_required_text, ServiceError};

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSkillRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSkillRequest {
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
}

/// Skill catalog CRUD. Skills are shared (not user-owned); names are unique,
/// compared case-insensitively.
pub struct SkillService<'a> {
    uow: &'a UnitOfWork,
}

impl<'a> SkillService<'a> {
    pub fn new(uow: &'a UnitOfWork) -> Self {
        Self { uow }
    }

    pub async fn create_skill(&self, request: CreateSkillRequest) -> Result<Skill, ServiceError> {
        debug!(name = %request.name, "Creating skill");
        let name = validate_required_text("name", &request.name, MAX_NAME_LEN)?;
        let category = validate_optional_text("category", request.category.as_deref(), MAX_CATEGORY_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        if self.name_taken(&name, None).await? {
            return Err(ServiceError::Conflict(format!(
                "A skill named '{}' already exists",
                name
            )));
        }

        let skill = Skill {
            id: Uuid::new_v4(),
            name,
            category,
            description,
            created_at: Utc::now(),
        };

        self.uow.skills().add(skill.clone());
        self.uow.commit().await?;

        info!(skill_id = %skill.id, name = %skill.name, "Created skill");
        Ok(skill)
    }

    pub async fn get_skill(&self, id: Uuid) -> Result<Option<Skill>, ServiceError> {
        Ok(self.uow.skills().get_by_id(id).await?)
    }

    pub async fn list_skills(&self) -> Result<Vec<Skill>, ServiceError> {
        let rows = sqlx::query_as::<_, Skill>("SELECT * FROM skills ORDER BY name")
            .fetch_all(self.uow.pool())
            .await?;
        Ok(rows)
    }

    pub async fn update_skill(&self, id: Uuid, request: UpdateSkillRequest) -> Result<Skill, ServiceError> {
        debug!(skill_id = %id, "Updating skill");
        let name = validate_required_text("name", &request.name, MAX_NAME_LEN)?;
        let category = validate_optional_text("category", request.category.as_deref(), MAX_CATEGORY_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let mut skill = self
            .uow
            .skills()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Skill not found".to_string()))?;

        if self.name_taken(&name, Some(id)).await? {
            return Err(ServiceError::Conflict(format!(
                "A skill named '{}' already exists",
                name
            )));
        }

        skill.name = name;
        skill.category = category;
        skill.description = description;

        self.uow.skills().update(skill.clone());
        self.uow.commit().await?;

        info!(skill_id = %id, "Updated skill");
        Ok(skill)
    }

    /// Delete a skill. A missing id answers false rather than failing.
    pub async fn delete_skill(&self, id: Uuid) -> Result<bool, ServiceError> {
        debug!(skill_id = %id, "Deleting skill");
        if !self.uow.skills().delete(id).await? {
            return Ok(false);
        }
        self.uow.commit().await?;
        info!(skill_id = %id, "Deleted skill");
        Ok(true)
    }

    async fn name_taken(&self, name: &str, exclude: Option<Uuid>) -> Result<bool, ServiceError> {
        let count: (i64,) = match exclude {
            Some(id) => {
                sqlx::query_as("SELECT COUNT(*) FROM skills WHERE lower(name) = lower($1) AND id <> $2")
                    .bind(name)
                    .bind(id)
                    .fetch_one(self.uow.pool())
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM skills WHERE lower(name) = lower($1)")
                    .bind(name)
                    .fetch_one(self.uow.pool())
                    .await?
            }
        };
        Ok(count.0 > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_uow() -> UnitOfWork {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://folio@127.0.0.1:1/folio")
            .expect("lazy pool");
        UnitOfWork::new(pool)
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let uow = offline_uow();
        let service = SkillService::new(&uow);
        let err = service
            .create_skill(CreateSkillRequest {
                name: "  ".to_string(),
                category: None,
                description: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
