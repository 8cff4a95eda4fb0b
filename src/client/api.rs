use reqwest::Method;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::client::cache::{CacheLookup, QueryCache};
use crate::client::keys::{portfolios, projects, skills, QueryKey};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}

/// Typed client over the HTTP API with an integrated query cache. Reads serve
/// fresh cache hits without a request; mutations update the cache surgically:
/// the detail entry is set from the mutation response, list namespaces are
/// invalidated wholesale, and parent-scoped namespaces are invalidated when
/// the child's foreign key is known.
pub struct FolioClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    pub cache: QueryCache,
}

impl FolioClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
            cache: QueryCache::default(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    async fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await?;
        let status = response.status();
        let payload: Value = response.json().await?;

        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("request failed")
                .to_string();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        payload
            .get("data")
            .cloned()
            .ok_or_else(|| ClientError::Malformed("missing data envelope".to_string()))
    }

    /// Cached read: a fresh entry short-circuits, anything else refetches and
    /// repopulates the entry.
    async fn cached_get(&mut self, path: &str, key: QueryKey) -> Result<Value, ClientError> {
        if let CacheLookup::Fresh(value) = self.cache.get(&key) {
            return Ok(value.clone());
        }
        let data = self.request(Method::GET, path, None).await?;
        self.cache.set(key, data.clone());
        Ok(data)
    }

    // Portfolios

    pub async fn list_portfolios(&mut self) -> Result<Value, ClientError> {
        self.cached_get("/api/portfolios", portfolios::list("mine")).await
    }

    pub async fn get_portfolio(&mut self, id: Uuid) -> Result<Value, ClientError> {
        self.cached_get(&format!("/api/portfolios/{}", id), portfolios::detail(id))
            .await
    }

    pub async fn create_portfolio(&mut self, body: &Value) -> Result<Value, ClientError> {
        let data = self.request(Method::POST, "/api/portfolios", Some(body)).await?;
        apply_portfolio_saved(&mut self.cache, &data);
        Ok(data)
    }

    pub async fn update_portfolio(&mut self, id: Uuid, body: &Value) -> Result<Value, ClientError> {
        let data = self
            .request(Method::PUT, &format!("/api/portfolios/{}", id), Some(body))
            .await?;
        apply_portfolio_saved(&mut self.cache, &data);
        Ok(data)
    }

    pub async fn delete_portfolio(&mut self, id: Uuid) -> Result<(), ClientError> {
        self.request(Method::DELETE, &format!("/api/portfolios/{}", id), None)
            .await?;
        apply_portfolio_deleted(&mut self.cache, id);
        Ok(())
    }

    pub async fn delete_portfolios(&mut self, ids: &[Uuid]) -> Result<usize, ClientError> {
        let mut deleted = 0;
        for id in ids {
            self.delete_portfolio(*id).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    // Projects

    pub async fn list_projects_for_portfolio(&mut self, portfolio_id: Uuid) -> Result<Value, ClientError> {
        self.cached_get(
            &format!("/api/portfolios/{}/projects", portfolio_id),
            projects::by_portfolio(portfolio_id),
        )
        .await
    }

    pub async fn get_project(&mut self, id: Uuid) -> Result<Value, ClientError> {
        self.cached_get(&format!("/api/projects/{}", id), projects::detail(id))
            .await
    }

    pub async fn create_project(&mut self, body: &Value) -> Result<Value, ClientError> {
        let data = self.request(Method::POST, "/api/projects", Some(body)).await?;
        apply_project_saved(&mut self.cache, &data);
        Ok(data)
    }

    pub async fn update_project(&mut self, id: Uuid, body: &Value) -> Result<Value, ClientError> {
        let data = self
            .request(Method::PUT, &format!("/api/projects/{}", id), Some(body))
            .await?;
        apply_project_saved(&mut self.cache, &data);
        Ok(data)
    }

    pub async fn delete_project(&mut self, id: Uuid, portfolio_id: Option<Uuid>) -> Result<(), ClientError> {
        self.request(Method::DELETE, &format!("/api/projects/{}", id), None)
            .await?;
        apply_project_deleted(&mut self.cache, id, portfolio_id);
        Ok(())
    }

    // Skills

    pub async fn list_skills(&mut self) -> Result<Value, ClientError> {
        self.cached_get("/api/skills", skills::list("all")).await
    }

    pub async fn create_skill(&mut self, body: &Value) -> Result<Value, ClientError> {
        let data = self.request(Method::POST, "/api/skills", Some(body)).await?;
        apply_skill_saved(&mut self.cache, &data);
        Ok(data)
    }

    pub async fn delete_skill(&mut self, id: Uuid) -> Result<(), ClientError> {
        self.request(Method::DELETE, &format!("/api/skills/{}", id), None)
            .await?;
        self.cache.remove(&skills::detail(id));
        self.cache.invalidate_prefix(&skills::lists());
        Ok(())
    }
}

fn entity_id(data: &Value) -> Option<Uuid> {
    data.get("id")?.as_str()?.parse().ok()
}

fn entity_portfolio_id(data: &Value) -> Option<Uuid> {
    data.get("portfolio_id")?.as_str()?.parse().ok()
}

/// Mutation response for a portfolio: set its detail entry, stale all lists.
pub(crate) fn apply_portfolio_saved(cache: &mut QueryCache, data: &Value) {
    if let Some(id) = entity_id(data) {
        cache.set(portfolios::detail(id), data.clone());
        cache.invalidate_prefix(&portfolios::stats(id));
    }
    cache.invalidate_prefix(&portfolios::lists());
}

pub(crate) fn apply_portfolio_deleted(cache: &mut QueryCache, id: Uuid) {
    cache.remove(&portfolios::detail(id));
    cache.invalidate_prefix(&portfolios::lists());
    // The portfolio's project list is now meaningless.
    cache.invalidate_prefix(&projects::by_portfolio(id));
}

/// Mutation response for a project: set detail, stale project lists, and
/// stale the owning portfolio's scoped caches when the foreign key is known.
pub(crate) fn apply_project_saved(cache: &mut QueryCache, data: &Value) {
    if let Some(id) = entity_id(data) {
        cache.set(projects::detail(id), data.clone());
    }
    cache.invalidate_prefix(&projects::lists());
    if let Some(portfolio_id) = entity_portfolio_id(data) {
        cache.invalidate_prefix(&projects::by_portfolio(portfolio_id));
        cache.invalidate_prefix(&portfolios::stats(portfolio_id));
    }
}

pub(crate) fn apply_project_deleted(cache: &mut QueryCache, id: Uuid, portfolio_id: Option<Uuid>) {
    cache.remove(&projects::detail(id));
    cache.invalidate_prefix(&projects::lists());
    if let Some(portfolio_id) = portfolio_id {
        cache.invalidate_prefix(&projects::by_portfolio(portfolio_id));
        cache.invalidate_prefix(&portfolios::stats(portfolio_id));
    }
}

pub(crate) fn apply_skill_saved(cache: &mut QueryCache, data: &Value) {
    if let Some(id) = entity_id(data) {
        cache.set(skills::detail(id), data.clone());
    }
    cache.invalidate_prefix(&skills::lists());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::cache::CacheLookup;
    use serde_json::json;
    use std::time::Instant;

    #[test]
    fn portfolio_save_sets_detail_and_stales_lists() {
        let mut cache = QueryCache::default();
        let now = Instant::now();
        cache.set_at(portfolios::list("mine"), json!([]), now);

        let id = Uuid::new_v4();
        let saved = json!({ "id": id.to_string(), "title": "My Work" });
        apply_portfolio_saved(&mut cache, &saved);

        assert!(matches!(
            cache.get_at(&portfolios::detail(id), now),
            CacheLookup::Fresh(_)
        ));
        assert!(matches!(
            cache.get_at(&portfolios::list("mine"), now),
            CacheLookup::Stale(_)
        ));
    }

    #[test]
    fn project_save_stales_parent_scoped_caches() {
        let mut cache = QueryCache::default();
        let now = Instant::now();
        let portfolio_id = Uuid::new_v4();
        cache.set_at(projects::by_portfolio(portfolio_id), json!([]), now);
        cache.set_at(portfolios::stats(portfolio_id), json!({}), now);

        let saved = json!({
            "id": Uuid::new_v4().to_string(),
            "portfolio_id": portfolio_id.to_string(),
            "title": "Site",
        });
        apply_project_saved(&mut cache, &saved);

        assert!(matches!(
            cache.get_at(&projects::by_portfolio(portfolio_id), now),
            CacheLookup::Stale(_)
        ));
        assert!(matches!(
            cache.get_at(&portfolios::stats(portfolio_id), now),
            CacheLookup::Stale(_)
        ));
    }

    #[test]
    fn project_save_without_fk_leaves_other_parent_scopes_alone() {
        let mut cache = QueryCache::default();
        let now = Instant::now();
        let other = Uuid::new_v4();
        cache.set_at(projects::by_portfolio(other), json!([]), now);

        let saved = json!({ "id": Uuid::new_v4().to_string(), "title": "No FK" });
        apply_project_saved(&mut cache, &saved);

        assert!(matches!(
            cache.get_at(&projects::by_portfolio(other), now),
            CacheLookup::Fresh(_)
        ));
    }

    #[test]
    fn portfolio_delete_removes_detail_and_stales_its_project_list() {
        let mut cache = QueryCache::default();
        let now = Instant::now();
        let id = Uuid::new_v4();
        cache.set_at(portfolios::detail(id), json!({}), now);
        cache.set_at(projects::by_portfolio(id), json!([]), now);

        apply_portfolio_deleted(&mut cache, id);

        assert_eq!(cache.get_at(&portfolios::detail(id), now), CacheLookup::Miss);
        assert!(matches!(
            cache.get_at(&projects::by_portfolio(id), now),
            CacheLookup::Stale(_)
        ));
    }
}
