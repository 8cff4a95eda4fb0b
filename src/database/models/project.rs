use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::entity::{BoundQuery, Entity, UuidKeyed};

/// A single piece of work inside a portfolio. Always belongs to exactly one
/// portfolio; cascades away with it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub repo_url: Option<String>,
    pub live_url: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for Project {
    const TABLE: &'static str = "projects";

    fn insert_query(&self) -> BoundQuery {
        sqlx::query(
            "INSERT INTO projects (id, portfolio_id, title, description, repo_url, live_url, \
             start_date, end_date, is_completed, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(self.id)
        .bind(self.portfolio_id)
        .bind(self.title.clone())
        .bind(self.description.clone())
        .bind(self.repo_url.clone())
        .bind(self.live_url.clone())
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.is_completed)
        .bind(self.created_at)
        .bind(self.updated_at)
    }

    fn update_query(&self) -> BoundQuery {
        sqlx::query(
            "UPDATE projects SET title = $2, description = $3, repo_url = $4, live_url = $5, \
             start_date = $6, end_date = $7, is_completed = $8, updated_at = $9 \
             WHERE id = $1",
        )
        .bind(self.id)
        .bind(self.title.clone())
        .bind(self.description.clone())
        .bind(self.repo_url.clone())
        .bind(self.live_url.clone())
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.is_completed)
        .bind(self.updated_at)
    }

    fn delete_query(&self) -> BoundQuery {
        sqlx::query("DELETE FROM projects WHERE id = $1").bind(self.id)
    }
}

impl UuidKeyed for Project {
    fn id(&self) -> Uuid {
        self.id
    }
}
