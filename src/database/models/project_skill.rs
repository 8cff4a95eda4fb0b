use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::database::entity::{BoundQuery, Entity};

/// Proficiency bounds for a skill on a project.
pub const MIN_PROFICIENCY: i16 = 1;
pub const MAX_PROFICIENCY: i16 = 5;

/// Association row linking a project to a skill, keyed by the
/// (project_id, skill_id) pair. All statements address the composite key;
/// there is no surrogate id.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProjectSkill {
    pub project_id: Uuid,
    pub skill_id: Uuid,
    pub proficiency_level: i16,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for ProjectSkill {
    const TABLE: &'static str = "project_skills";

    fn insert_query(&self) -> BoundQuery {
        sqlx::query(
            "INSERT INTO project_skills (project_id, skill_id, proficiency_level, is_primary, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(self.project_id)
        .bind(self.skill_id)
        .bind(self.proficiency_level)
        .bind(self.is_primary)
        .bind(self.created_at)
    }

    fn update_query(&self) -> BoundQuery {
        sqlx::query(
            "UPDATE project_skills SET proficiency_level = $3, is_primary = $4 \
             WHERE project_id = $1 AND skill_id = $2",
        )
        .bind(self.project_id)
        .bind(self.skill_id)
        .bind(self.proficiency_level)
        .bind(self.is_primary)
    }

    fn delete_query(&self) -> BoundQuery {
        sqlx::query("DELETE FROM project_skills WHERE project_id = $1 AND skill_id = $2")
            .bind(self.project_id)
            .bind(self.skill_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn delete_statement_addresses_composite_key() {
        let row = ProjectSkill {
            project_id: Uuid::new_v4(),
            skill_id: Uuid::new_v4(),
            proficiency_level: 3,
            is_primary: false,
            created_at: Utc::now(),
        };
        let sql = row.delete_query().sql();
        assert!(sql.contains("project_id = $1"));
        assert!(sql.contains("skill_id = $2"));
    }
}
