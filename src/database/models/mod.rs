pub mod audit;
pub mod oauth;
pub mod portfolio;
pub mod project;
pub mod project_skill;
pub mod skill;
pub mod user;

pub use audit::{AuthenticationAuditLog, FailedLoginAttempt, SecurityAuditLog, UserActivityAuditLog};
pub use oauth::{OAuthClient, ScopeDefinition, UserConsent, UserPermission};
pub use portfolio::Portfolio;
pub use project::Project;
pub use project_skill::ProjectSkill;
pub use skill::Skill;
pub use user::{User, UserSession};
