pub mod account_service;
pub mod audit_service;
pub mod portfolio_service;
pub mod project_service;
pub mod project_skill_service;
pub mod skill_service;

pub use account_service::AccountService;
pub use audit_service::AuditService;
pub use portfolio_service::{CreatePortfolioRequest, PortfolioService, UpdatePortfolioRequest};
pub use project_service::{CreateProjectRequest, ProjectService, UpdateProjectRequest};
pub use project_skill_service::{AddSkillToProjectRequest, ProjectSkillService, UpdateProjectSkillRequest};
pub use skill_service::{CreateSkillRequest, SkillService, UpdateSkillRequest};

use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Failures surfaced by the domain services. The endpoint layer translates
/// these into HTTP status codes.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::from(err))
    }
}

/// Trimmed required-text validation shared by the services.
pub(crate) fn validate_required_text(
    field: &str,
    value: &str,
    max_len: usize,
) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > max_len {
        return Err(ServiceError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(trimmed.to_string())
}

/// Optional-text validation: blank collapses to None.
pub(crate) fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ServiceError> {
    match value {
        None => Ok(None),
        Some(v) => {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.len() > max_len {
                return Err(ServiceError::Validation(format!(
                    "{} must be at most {} characters",
                    field, max_len
                )));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_rejects_blank_and_overlong() {
        assert!(validate_required_text("title", "   ", 200).is_err());
        assert!(validate_required_text("title", &"x".repeat(201), 200).is_err());
        assert_eq!(validate_required_text("title", "  ok  ", 200).unwrap(), "ok");
    }

    #[test]
    fn optional_text_collapses_blank_to_none() {
        assert_eq!(validate_optional_text("d", Some("  "), 10).unwrap(), None);
        assert_eq!(validate_optional_text("d", None, 10).unwrap(), None);
        assert!(validate_optional_text("d", Some("12345678901"), 10).is_err());
    }
}
