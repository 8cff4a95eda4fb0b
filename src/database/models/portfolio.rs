use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::entity::{BoundQuery, Entity, UuidKeyed};

/// A user-owned collection of projects. The owner is fixed at creation; the
/// update statement deliberately never touches `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Portfolio {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Portfolio {
    const TABLE: &'static str = "portfolios";

    fn insert_query(&self) -> BoundQuery {
        sqlx::query(
            "INSERT INTO portfolios (id, user_id, title, description, is_public, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(self.id)
        .bind(self.user_id)
        .bind(self.title.clone())
        .bind(self.description.clone())
        .bind(self.is_public)
        .bind(self.created_at)
        .bind(self.updated_at)
    }

    fn update_query(&self) -> BoundQuery {
        sqlx::query(
            "UPDATE portfolios SET title = $2, description = $3, is_public = $4, updated_at = $5 \
             WHERE id = $1",
        )
        .bind(self.id)
        .bind(self.title.clone())
        .bind(self.description.clone())
        .bind(self.is_public)
        .bind(self.updated_at)
    }

    fn delete_query(&self) -> BoundQuery {
        sqlx::query("DELETE FROM portfolios WHERE id = $1").bind(self.id)
    }
}

impl UuidKeyed for Portfolio {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    fn sample() -> Portfolio {
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

    #[test]
    fn update_statement_never_reassigns_owner() {
        let sql = sample().update_query().sql();
        assert!(sql.starts_with("UPDATE portfolios SET"));
        assert!(!sql.contains("user_id"));
    }

    #[test]
    fn insert_statement_targets_all_columns() {
        let sql = sample().insert_query().sql();
        assert!(sql.contains("INSERT INTO portfolios"));
        assert!(sql.contains("is_public"));
    }
}
