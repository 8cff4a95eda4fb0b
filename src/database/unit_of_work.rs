use sqlx::PgPool;
use tracing::{debug, error};

use crate::database::manager::DatabaseError;
use crate::database::models::{Portfolio, Project, ProjectSkill, Skill};
use crate::database::repository::{ChangeLog, Repository};

/// Transactional boundary over the domain repositories. One instance per
/// request; each entity type gets exactly one repository for the lifetime of
/// the unit of work, all staging into one shared change log. `commit`
/// persists everything staged in a single database transaction or nothing
/// at all.
pub struct UnitOfWork {
    pool: PgPool,
    changes: ChangeLog,
    portfolios: Repository<Portfolio>,
    projects: Repository<Project>,
    skills: Repository<Skill>,
    project_skills: Repository<ProjectSkill>,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        let changes = ChangeLog::new();
        Self {
            portfolios: Repository::new(pool.clone(), changes.clone()),
            projects: Repository::new(pool.clone(), changes.clone()),
            skills: Repository::new(pool.clone(), changes.clone()),
            project_skills: Repository::new(pool.clone(), changes.clone()),
            pool,
            changes,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn portfolios(&self) -> &Repository<Portfolio> {
        &self.portfolios
    }

    pub fn projects(&self) -> &Repository<Project> {
        &self.projects
    }

    pub fn skills(&self) -> &Repository<Skill> {
        &self.skills
    }

    pub fn project_skills(&self) -> &Repository<ProjectSkill> {
        &self.project_skills
    }

    /// Number of staged, uncommitted changes.
    pub fn pending_changes(&self) -> usize {
        self.changes.len()
    }

    /// Execute every staged change inside one transaction. On any failure the
    /// transaction rolls back, nothing is persisted, the stage is left intact
    /// and the error propagates. Returns the number of rows affected.
    pub async fn commit(&self) -> Result<u64, DatabaseError> {
        let queries = self.changes.queries();
        if queries.is_empty() {
            return Ok(0);
        }

        let count = queries.len();
        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to open transaction for {} staged changes: {}", count, e);
            DatabaseError::from(e)
        })?;

        let mut affected = 0u64;
        for query in queries {
            match query.execute(&mut *tx).await {
                Ok(result) => affected += result.rows_affected(),
                Err(e) => {
                    error!("Commit failed, rolling back {} staged changes: {}", count, e);
                    // Dropping the transaction rolls it back.
                    return Err(DatabaseError::from(e));
                }
            }
        }

        tx.commit().await?;
        self.changes.clear();
        debug!(changes = count, rows = affected, "Committed unit of work");
        Ok(affected)
    }

    /// Discard all staged changes so the instance can be reused.
    pub fn rollback(&self) {
        let dropped = self.changes.len();
        self.changes.clear();
        if dropped > 0 {
            debug!(changes = dropped, "Rolled back staged changes");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn unreachable_uow() -> UnitOfWork {
        // Port 1 refuses connections; commit must fail fast without a server.
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_secs(2))
            .connect_lazy("postgres://folio@127.0.0.1:1/folio")
            .expect("lazy pool");
        UnitOfWork::new(pool)
    }

    fn sample_portfolio() -> Portfolio {
        Portfolio {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "My Work".to_string(),
            description: None,
            is_public: false,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn repositories_share_one_change_log() {
        let uow = unreachable_uow();
        let portfolio = sample_portfolio();
        uow.portfolios().add(portfolio.clone());
        uow.projects().add(crate::database::models::Project {
            id: Uuid::new_v4(),
            portfolio_id: portfolio.id,
            title: "Site".to_string(),
            description: None,
            repo_url: None,
            live_url: None,
            start_date: Utc::now(),
            end_date: None,
            is_completed: false,
            created_at: Utc::now(),
            updated_at: None,
        });
        assert_eq!(uow.pending_changes(), 2);
    }

    #[tokio::test]
    async fn rollback_discards_staged_changes() {
        let uow = unreachable_uow();
        uow.portfolios().add(sample_portfolio());
        assert_eq!(uow.pending_changes(), 1);
        uow.rollback();
        assert_eq!(uow.pending_changes(), 0);
    }

    #[tokio::test]
    async fn commit_with_nothing_staged_is_a_no_op() {
        let uow = unreachable_uow();
        assert_eq!(uow.commit().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_commit_leaves_stage_intact() {
        let uow = unreachable_uow();
        uow.portfolios().add(sample_portfolio());
        let err = uow.commit().await;
        assert!(err.is_err());
        // Nothing was persisted and the stage survives for retry/inspection.
        assert_eq!(uow.pending_changes(), 1);
    }
}
