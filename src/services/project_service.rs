use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::authz::AccessPolicy;
use crate::database::models::Project;
use crate::database::UnitOfWork;
use crate::services::{validate_optional_text, validate_required_text, ServiceError};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_URL_LEN: usize = 2048;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub portfolio_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    /// Defaults to the creation time when absent.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

/// Project CRUD. Every project hangs off exactly one existing portfolio, and
/// mutations require access to that portfolio.
pub struct ProjectService<'a> {
    uow: &'a UnitOfWork,
    policy: &'a dyn AccessPolicy,
}

impl<'a> ProjectService<'a> {
    pub fn new(uow: &'a UnitOfWork, policy: &'a dyn AccessPolicy) -> Self {
        Self { uow, policy }
    }

    pub async fn create_project(
        &self,
        user_id: Uuid,
        request: CreateProjectRequest,
    ) -> Result<Project, ServiceError> {
        debug!(portfolio_id = %request.portfolio_id, user_id = %user_id, "Creating project");
        let title = validate_required_text("title", &request.title, MAX_TITLE_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        let repo_url = validate_optional_text("repo_url", request.repo_url.as_deref(), MAX_URL_LEN)?;
        let live_url = validate_optional_text("live_url", request.live_url.as_deref(), MAX_URL_LEN)?;

        let now = Utc::now();
        let start_date = request.start_date.unwrap_or(now);
        if let Some(end) = request.end_date {
            if end < start_date {
                return Err(ServiceError::Validation(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }

        if self
            .uow
            .portfolios()
            .get_by_id(request.portfolio_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::NotFound("Portfolio not found".to_string()));
        }

        if !self
            .policy
            .can_manage_portfolio(user_id, request.portfolio_id)
            .await?
        {
            warn!(portfolio_id = %request.portfolio_id, user_id = %user_id, "Rejected project create: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this portfolio".to_string(),
            ));
        }

        let project = Project {
            id: Uuid::new_v4(),
            portfolio_id: request.portfolio_id,
            title,
            description,
            repo_url,
            live_url,
            start_date,
            end_date: request.end_date,
            is_completed: request.is_completed,
            created_at: now,
            updated_at: None,
        };

        self.uow.projects().add(project.clone());
        self.uow.commit().await?;

        info!(project_id = %project.id, portfolio_id = %project.portfolio_id, "Created project");
        Ok(project)
    }

    pub async fn get_project(&self, id: Uuid) -> Result<Option<Project>, ServiceError> {
        Ok(self.uow.projects().get_by_id(id).await?)
    }

    pub async fn list_for_portfolio(&self, portfolio_id: Uuid) -> Result<Vec<Project>, ServiceError> {
        let rows = sqlx::query_as::<_, Project>(
            "SELECT * FROM projects WHERE portfolio_id = $1 ORDER BY start_date DESC",
        )
        .bind(portfolio_id)
        .fetch_all(self.uow.pool())
        .await?;
        Ok(rows)
    }

    pub async fn update_project(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdateProjectRequest,
    ) -> Result<Project, ServiceError> {
        debug!(project_id = %id, user_id = %user_id, "Updating project");
        let title = validate_required_text("title", &request.title, MAX_TITLE_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;
        let repo_url = validate_optional_text("repo_url", request.repo_url.as_deref(), MAX_URL_LEN)?;
        let live_url = validate_optional_text("live_url", request.live_url.as_deref(), MAX_URL_LEN)?;

        let mut project = self
            .uow
            .projects()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Project not found".to_string()))?;

        if !self.policy.can_manage_project(user_id, id).await? {
            warn!(project_id = %id, user_id = %user_id, "Rejected project update: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this project".to_string(),
            ));
        }

        let start_date = request.start_date.unwrap_or(project.start_date);
        if let Some(end) = request.end_date {
            if end < start_date {
                return Err(ServiceError::Validation(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }

        project.title = title;
        project.description = description;
        project.repo_url = repo_url;
        project.live_url = live_url;
        project.start_date = start_date;
        project.end_date = request.end_date;
        project.is_completed = request.is_completed;
        project.updated_at = Some(Utc::now());

        self.uow.projects().update(project.clone());
        self.uow.commit().await?;

        info!(project_id = %id, "Updated project");
        Ok(project)
    }

    /// Delete a project. A missing id answers false rather than failing.
    pub async fn delete_project(&self, user_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        debug!(project_id = %id, user_id = %user_id, "Deleting project");
        if self.uow.projects().get_by_id(id).await?.is_none() {
            return Ok(false);
        }

        if !self.policy.can_manage_project(user_id, id).await? {
            warn!(project_id = %id, user_id = %user_id, "Rejected project delete: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this project".to_string(),
            ));
        }

        self.uow.projects().delete(id).await?;
        self.uow.commit().await?;

        info!(project_id = %id, "Deleted project");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::OwnerPolicy;

    fn offline_uow() -> UnitOfWork {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://folio@127.0.0.1:1/folio")
            .expect("lazy pool");
        UnitOfWork::new(pool)
    }

    #[tokio::test]
    async fn create_rejects_end_before_start() {
        let uow = offline_uow();
        let policy = OwnerPolicy::new(uow.pool().clone());
        let service = ProjectService::new(&uow, &policy);

        let start = Utc::now();
        let err = service
            .create_project(
                Uuid::new_v4(),
                CreateProjectRequest {
                    portfolio_id: Uuid::new_v4(),
                    title: "Site".to_string(),
                    description: None,
                    repo_url: None,
                    live_url: None,
                    start_date: Some(start),
                    end_date: Some(start - chrono::Duration::days(1)),
                    is_completed: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(uow.pending_changes(), 0);
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let uow = offline_uow();
        let policy = OwnerPolicy::new(uow.pool().clone());
        let service = ProjectService::new(&uow, &policy);

        let err = service
            .create_project(
                Uuid::new_v4(),
                CreateProjectRequest {
                    portfolio_id: Uuid::new_v4(),
                    title: String::new(),
                    description: None,
                    repo_url: None,
                    live_url: None,
                    start_date: None,
                    end_date: None,
                    is_completed: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
