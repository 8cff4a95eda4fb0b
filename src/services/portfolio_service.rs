use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::authz::AccessPolicy;
use crate::database::models::Portfolio;
use crate::database::UnitOfWork;
use crate::services::{validate_optional_text, validate_required_text, ServiceError};

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortfolioRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePortfolioRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// Portfolio CRUD with ownership enforcement. The owner is set at creation
/// and never reassigned.
pub struct PortfolioService<'a> {
    uow: &'a UnitOfWork,
    policy: &'a dyn AccessPolicy,
}

impl<'a> PortfolioService<'a> {
    pub fn new(uow: &'a UnitOfWork, policy: &'a dyn AccessPolicy) -> Self {
        Self { uow, policy }
    }

    pub async fn create_portfolio(
        &self,
        owner_id: Uuid,
        request: CreatePortfolioRequest,
    ) -> Result<Portfolio, ServiceError> {
        debug!(user_id = %owner_id, "Creating portfolio");
        let title = validate_required_text("title", &request.title, MAX_TITLE_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let portfolio = Portfolio {
            id: Uuid::new_v4(),
            user_id: owner_id,
            title,
            description,
            is_public: request.is_public,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.uow.portfolios().add(portfolio.clone());
        self.uow.commit().await.map_err(|e| {
            warn!(user_id = %owner_id, "Portfolio creation failed: {}", e);
            e
        })?;

        info!(portfolio_id = %portfolio.id, user_id = %owner_id, "Created portfolio");
        Ok(portfolio)
    }

    pub async fn get_portfolio(&self, id: Uuid) -> Result<Option<Portfolio>, ServiceError> {
        Ok(self.uow.portfolios().get_by_id(id).await?)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Portfolio>, ServiceError> {
        let rows = sqlx::query_as::<_, Portfolio>(
            "SELECT * FROM portfolios WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.uow.pool())
        .await?;
        Ok(rows)
    }

    pub async fn list_public(&self) -> Result<Vec<Portfolio>, ServiceError> {
        let rows = sqlx::query_as::<_, Portfolio>(
            "SELECT * FROM portfolios WHERE is_public ORDER BY created_at DESC",
        )
        .fetch_all(self.uow.pool())
        .await?;
        Ok(rows)
    }

    pub async fn update_portfolio(
        &self,
        user_id: Uuid,
        id: Uuid,
        request: UpdatePortfolioRequest,
    ) -> Result<Portfolio, ServiceError> {
        debug!(portfolio_id = %id, user_id = %user_id, "Updating portfolio");
        let title = validate_required_text("title", &request.title, MAX_TITLE_LEN)?;
        let description =
            validate_optional_text("description", request.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let mut portfolio = self
            .uow
            .portfolios()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Portfolio not found".to_string()))?;

        if !self.policy.can_manage_portfolio(user_id, id).await? {
            warn!(portfolio_id = %id, user_id = %user_id, "Rejected portfolio update: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this portfolio".to_string(),
            ));
        }

        portfolio.title = title;
        portfolio.description = description;
        portfolio.is_public = request.is_public;
        portfolio.updated_at = Some(Utc::now());

        self.uow.portfolios().update(portfolio.clone());
        self.uow.commit().await?;

        info!(portfolio_id = %id, user_id = %user_id, "Updated portfolio");
        Ok(portfolio)
    }

    /// Delete a portfolio. A missing id answers false rather than failing.
    pub async fn delete_portfolio(&self, user_id: Uuid, id: Uuid) -> Result<bool, ServiceError> {
        debug!(portfolio_id = %id, user_id = %user_id, "Deleting portfolio");
        if self.uow.portfolios().get_by_id(id).await?.is_none() {
            return Ok(false);
        }

        if !self.policy.can_manage_portfolio(user_id, id).await? {
            warn!(portfolio_id = %id, user_id = %user_id, "Rejected portfolio delete: not the owner");
            return Err(ServiceError::Forbidden(
                "You do not have access to this portfolio".to_string(),
            ));
        }

        self.uow.portfolios().delete(id).await?;
        self.uow.commit().await?;

        info!(portfolio_id = %id, user_id = %user_id, "Deleted portfolio");
        Ok(true)
    }

    /// Strict ownership check: true iff the portfolio exists and is owned by
    /// `user_id`.
    pub async fn user_owns_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<bool, ServiceError> {
        Ok(self.policy.owns_portfolio(user_id, portfolio_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::OwnerPolicy;
    use crate::database::UnitOfWork;

    fn offline_uow() -> UnitOfWork {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://folio@127.0.0.1:1/folio")
            .expect("lazy pool");
        UnitOfWork::new(pool)
    }

    #[tokio::test]
    async fn create_rejects_blank_title_before_touching_the_database() {
        let uow = offline_uow();
        let policy = OwnerPolicy::new(uow.pool().clone());
        let service = PortfolioService::new(&uow, &policy);

        let err = service
            .create_portfolio(
                Uuid::new_v4(),
                CreatePortfolioRequest {
                    title: "   ".to_string(),
                    description: None,
                    is_public: false,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(uow.pending_changes(), 0);
    }

    #[tokio::test]
    async fn create_rejects_title_over_200_chars() {
        let uow = offline_uow();
        let policy = OwnerPolicy::new(uow.pool().clone());
        let service = PortfolioService::new(&uow, &policy);

        let err = service
            .create_portfolio(
                Uuid::new_v4(),
                CreatePortfolioRequest {
                    title: "x".repeat(201),
                    description: None,
                    is_public: true,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
