use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{FromRow, Postgres};

/// A fully bound query ready for execution inside a transaction.
pub type BoundQuery = sqlx::query::Query<'static, Postgres, PgArguments>;

/// Persistence contract for an entity type. Each implementation supplies the
/// table name and bound insert/update/delete statements; the repository and
/// unit of work decide when those statements actually run.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    const TABLE: &'static str;

    /// Statement inserting this row.
    fn insert_query(&self) -> BoundQuery;

    /// Statement replacing the mutable columns of this row, addressed by key.
    fn update_query(&self) -> BoundQuery;

    /// Statement deleting this row, addressed by key.
    fn delete_query(&self) -> BoundQuery;
}

/// Marker for entities addressed by a single `id uuid` primary key.
/// `ProjectSkill` is keyed by its composite (project_id, skill_id) pair and
/// does not implement this.
pub trait UuidKeyed: Entity {
    fn id(&self) -> uuid::Uuid;
}
