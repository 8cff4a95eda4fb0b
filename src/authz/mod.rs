use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;

/// Permission that lets a user manage portfolios they do not own.
pub const MANAGE_PORTFOLIOS: &str = "portfolios:manage";

/// Permission required to read the security audit trail.
pub const VIEW_AUDIT_EVENTS: &str = "audit:view";

/// Single policy-evaluation seam consumed by every domain service, instead of
/// ad hoc owner-id comparisons scattered across them.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// Strict ownership: true iff the portfolio exists and its owner id
    /// equals `user_id`.
    async fn owns_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<bool, DatabaseError>;

    /// Ownership or an active administrative grant.
    async fn can_manage_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<bool, DatabaseError>;

    /// Ownership of the portfolio the project belongs to, or an active
    /// administrative grant.
    async fn can_manage_project(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, DatabaseError>;

    /// Whether the user may read the security audit trail.
    async fn can_view_audit_events(&self, user_id: Uuid) -> Result<bool, DatabaseError>;
}

/// Postgres-backed policy: ownership by owner-id equality, with rows in
/// `user_permissions` granting an override while unrevoked and unexpired.
pub struct OwnerPolicy {
    pool: PgPool,
}

impl OwnerPolicy {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn has_active_permission(&self, user_id: Uuid, permission: &str) -> Result<bool, DatabaseError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM user_permissions \
             WHERE user_id = $1 AND permission = $2 \
             AND revoked_at IS NULL AND (expires_at IS NULL OR expires_at > now())",
        )
        .bind(user_id)
        .bind(permission)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0 > 0)
    }
}

#[async_trait]
impl AccessPolicy for OwnerPolicy {
    async fn owns_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<bool, DatabaseError> {
        let owner: Option<(Uuid,)> = sqlx::query_as("SELECT user_id FROM portfolios WHERE id = $1")
            .bind(portfolio_id)
            .fetch_optional(&self.pool)
            .await?;
        // Missing portfolio or a different owner both answer false.
        Ok(owner.map(|(id,)| id == user_id).unwrap_or(false))
    }

    async fn can_manage_portfolio(&self, user_id: Uuid, portfolio_id: Uuid) -> Result<bool, DatabaseError> {
        if self.owns_portfolio(user_id, portfolio_id).await? {
            return Ok(true);
        }
        self.has_active_permission(user_id, MANAGE_PORTFOLIOS).await
    }

    async fn can_manage_project(&self, user_id: Uuid, project_id: Uuid) -> Result<bool, DatabaseError> {
        let owner: Option<(Uuid,)> = sqlx::query_as(
            "SELECT p.user_id FROM portfolios p \
             JOIN projects pr ON pr.portfolio_id = p.id \
             WHERE pr.id = $1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;
        match owner {
            Some((id,)) if id == user_id => Ok(true),
            Some(_) => self.has_active_permission(user_id, MANAGE_PORTFOLIOS).await,
            None => Ok(false),
        }
    }

    async fn can_view_audit_events(&self, user_id: Uuid) -> Result<bool, DatabaseError> {
        self.has_active_permission(user_id, VIEW_AUDIT_EVENTS).await
    }
}
