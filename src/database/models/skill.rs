use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::entity::{BoundQuery, Entity, UuidKeyed};

/// A named skill, shared across projects. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Skill {
    const TABLE: &'static str = "skills";

    fn insert_query(&self) -> BoundQuery {
        sqlx::query(
            "INSERT INTO skills (id, name, category, description, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.id)
        .bind(self.name.clone())
        .bind(self.category.clone())
        .bind(self.description.clone())
        .bind(self.created_at)
    }

    fn update_query(&self) -> BoundQuery {
        sqlx::query("UPDATE skills SET name = $2, category = $3, description = $4 WHERE id = $1")
            .bind(self.id)
            .bind(self.name.clone())
            .bind(self.category.clone())
            .bind(self.description.clone())
    }

    fn delete_query(&self) -> BoundQuery {
        sqlx::query("DELETE FROM skills WHERE id = $1").bind(self.id)
    }
}

impl UuidKeyed for Skill {
    fn id(&self) -> Uuid {
        self.id
    }
}
