use axum::extract::Path;
use uuid::Uuid;

use crate::database::models::{Portfolio, Project};
use crate::database::{DatabaseManager, UnitOfWork};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};

/// GET /public/portfolios - anonymous browse of public portfolios
pub async fn list_portfolios() -> ApiResult<Vec<Portfolio>> {
    let pool = DatabaseManager::pool().await?;
    let rows = sqlx::query_as::<_, Portfolio>(
        "SELECT * FROM portfolios WHERE is_public ORDER BY created_at DESC",
    )
    .fetch_all(&pool)
    .await
    .map_err(crate::database::DatabaseError::from)?;
    Ok(ApiResponse::success(rows))
}

/// GET /public/portfolios/:id - a private portfolio is indistinguishable from
/// a missing one
pub async fn get_portfolio(Path(id): Path<Uuid>) -> ApiResult<Portfolio> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool);

    match uow.portfolios().get_by_id(id).await.map_err(ApiError::from)? {
        Some(p) if p.is_public => Ok(ApiResponse::success(p)),
        _ => Err(ApiError::not_found("Portfolio not found")),
    }
}

/// GET /public/portfolios/:id/projects
pub async fn list_projects(Path(id): Path<Uuid>) -> ApiResult<Vec<Project>> {
    let pool = DatabaseManager::pool().await?;
    let uow = UnitOfWork::new(pool.clone());

    match uow.portfolios().get_by_id(id).await.map_err(ApiError::from)? {
        Some(p) if p.is_public => {}
        _ => return Err(ApiError::not_found("Portfolio not found")),
    }

    let rows = sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE portfolio_id = $1 ORDER BY start_date DESC",
    )
    .bind(id)
    .fetch_all(&pool)
    .await
    .map_err(crate::database::DatabaseError::from)?;
    Ok(ApiResponse::success(rows))
}
