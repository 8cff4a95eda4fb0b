use axum::response::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;

/// GET / - service info
pub async fn service_info() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Folio API",
            "version": version,
            "description": "Portfolio management backend API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health/db (public)",
                "browse": "/public/portfolios (public)",
                "authorize": "/connect/authorize, /connect/token, /connect/userinfo (token acquisition)",
                "account": "/api/auth/* (protected)",
                "portfolios": "/api/portfolios[/:id] (protected)",
                "projects": "/api/projects[/:id] (protected)",
                "skills": "/api/skills[/:id] (protected)",
                "project_skills": "/api/projects/:id/skills[/:skill_id] (protected)",
            }
        }
    }))
}

#[derive(Debug, Serialize)]
pub struct DbHealth {
    #[serde(rename = "Status")]
    pub status: &'static str,
    #[serde(rename = "Host")]
    pub host: String,
    #[serde(rename = "Database")]
    pub database: String,
}

/// GET /health/db - liveness plus database connectivity. 200 with connection
/// info when reachable, 500 with a problem-details body when not.
pub async fn health_db() -> Result<Json<DbHealth>, ApiError> {
    match DatabaseManager::health_check().await {
        Ok(()) => {
            let info = DatabaseManager::connection_info()
                .map_err(|e| ApiError::internal_server_error(format!("Database connection failed: {}", e)))?;
            Ok(Json(DbHealth {
                status: "Connected",
                host: info.host,
                database: info.database,
            }))
        }
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            Err(ApiError::internal_server_error(format!(
                "Database connection failed: {}",
                e
            )))
        }
    }
}
