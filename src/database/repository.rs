use sqlx::PgPool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::database::entity::{BoundQuery, Entity, UuidKeyed};
use crate::database::manager::DatabaseError;
use crate::database::models::ProjectSkill;

/// What a staged change will do when the unit of work commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A deferred write: the statement is rebuilt from the captured entity each
/// time it is needed, so a failed commit leaves the stage replayable.
pub struct StagedChange {
    pub kind: ChangeKind,
    pub table: &'static str,
    build: Box<dyn Fn() -> BoundQuery + Send + Sync>,
}

impl StagedChange {
    fn new(kind: ChangeKind, table: &'static str, build: impl Fn() -> BoundQuery + Send + Sync + 'static) -> Self {
        Self { kind, table, build: Box::new(build) }
    }

    pub fn query(&self) -> BoundQuery {
        (self.build)()
    }
}

/// Shared in-memory change tracker. Every repository handed out by one unit
/// of work stages into the same log; nothing reaches the database until the
/// unit of work commits.
#[derive(Clone, Default)]
pub struct ChangeLog {
    inner: Arc<Mutex<Vec<StagedChange>>>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, change: StagedChange) {
        self.inner.lock().expect("change log poisoned").push(change);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("change log poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.inner.lock().expect("change log poisoned").clear();
    }

    /// Rebuild every staged statement, in staging order.
    pub fn queries(&self) -> Vec<BoundQuery> {
        self.inner
            .lock()
            .expect("change log poisoned")
            .iter()
            .map(|c| c.query())
            .collect()
    }
}

/// Per-entity-type CRUD adapter. Reads hit the pool directly; writes are
/// staged into the shared change log and persist only on commit.
pub struct Repository<T> {
    pool: PgPool,
    changes: ChangeLog,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(pool: PgPool, changes: ChangeLog) -> Self {
        Self {
            pool,
            changes,
            _phantom: std::marker::PhantomData,
        }
    }

    /// Full table scan. Pagination, if any, happens above this layer.
    pub async fn get_all(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} ORDER BY created_at", T::TABLE);
        let rows = sqlx::query_as::<_, T>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Stage an insert.
    pub fn add(&self, entity: T) {
        self.changes.push(StagedChange::new(ChangeKind::Insert, T::TABLE, move || {
            entity.insert_query()
        }));
    }

    /// Stage a replacement of the row's mutable columns.
    pub fn update(&self, entity: T) {
        self.changes.push(StagedChange::new(ChangeKind::Update, T::TABLE, move || {
            entity.update_query()
        }));
    }
}

impl<T: UuidKeyed> Repository<T> {
    /// Fetch by primary key. A missing id is `None`, not an error.
    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, DatabaseError> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", T::TABLE);
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Load the row, then stage its removal. Returns false when the id does
    /// not exist (nothing staged).
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        match self.get_by_id(id).await? {
            Some(entity) => {
                self.changes.push(StagedChange::new(ChangeKind::Delete, T::TABLE, move || {
                    entity.delete_query()
                }));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// Composite-key access for the project/skill association.
impl Repository<ProjectSkill> {
    pub async fn get_by_key(
        &self,
        project_id: Uuid,
        skill_id: Uuid,
    ) -> Result<Option<ProjectSkill>, DatabaseError> {
        let row = sqlx::query_as::<_, ProjectSkill>(
            "SELECT * FROM project_skills WHERE project_id = $1 AND skill_id = $2",
        )
        .bind(project_id)
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_for_project(&self, project_id: Uuid) -> Result<Vec<ProjectSkill>, DatabaseError> {
        let rows = sqlx::query_as::<_, ProjectSkill>(
            "SELECT * FROM project_skills WHERE project_id = $1 ORDER BY is_primary DESC, created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Composite-key variant of `delete`: load the pair, stage its removal.
    pub async fn delete_by_key(&self, project_id: Uuid, skill_id: Uuid) -> Result<bool, DatabaseError> {
        match self.get_by_key(project_id, skill_id).await? {
            Some(row) => {
                self.changes.push(StagedChange::new(
                    ChangeKind::Delete,
                    ProjectSkill::TABLE,
                    move || row.delete_query(),
                ));
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::Portfolio;
    use chrono::Utc;
    use sqlx::Execute;

    fn lazy_pool() -> PgPool {
        // Never connects; staging must not touch the database.
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://folio@127.0.0.1:1/folio")
            .expect("lazy pool")
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
    async fn writes_are_staged_not_executed() {
        let changes = ChangeLog::new();
        let repo: Repository<Portfolio> = Repository::new(lazy_pool(), changes.clone());

        repo.add(sample_portfolio());
        repo.update(sample_portfolio());

        assert_eq!(changes.len(), 2);
        let queries = changes.queries();
        assert!(queries[0].sql().starts_with("INSERT INTO portfolios"));
        assert!(queries[1].sql().starts_with("UPDATE portfolios"));
    }

    #[tokio::test]
    async fn staged_statements_are_replayable() {
        let changes = ChangeLog::new();
        let repo: Repository<Portfolio> = Repository::new(lazy_pool(), changes.clone());
        repo.add(sample_portfolio());

        // Building twice must yield the statement both times.
        let first = changes.queries();
        let second = changes.queries();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].sql(), second[0].sql());
    }
}
