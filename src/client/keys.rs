use uuid::Uuid;

/// Hierarchical cache address. Keys form a tree by prefix: invalidating
/// `["portfolios", "list"]` hits every list variant under it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
    pub fn root(namespace: &str) -> Self {
        Self(vec![namespace.to_string()])
    }

    pub fn push(mut self, part: impl Into<String>) -> Self {
        self.0.push(part.into());
        self
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &QueryKey) -> bool {
        self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
    }
}

/// Key factory for portfolio queries.
pub mod portfolios {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("portfolios")
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }

    pub fn list(filter: &str) -> QueryKey {
        lists().push(filter)
    }

    pub fn details() -> QueryKey {
        all().push("detail")
    }

    pub fn detail(id: Uuid) -> QueryKey {
        details().push(id.to_string())
    }

    pub fn stats(id: Uuid) -> QueryKey {
        all().push("stats").push(id.to_string())
    }
}

/// Key factory for project queries.
pub mod projects {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("projects")
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }

    pub fn list(filter: &str) -> QueryKey {
        lists().push(filter)
    }

    /// Parent-scoped list, invalidated whenever one of the portfolio's
    /// projects changes.
    pub fn by_portfolio(portfolio_id: Uuid) -> QueryKey {
        all().push("by-portfolio").push(portfolio_id.to_string())
    }

    pub fn details() -> QueryKey {
        all().push("detail")
    }

    pub fn detail(id: Uuid) -> QueryKey {
        details().push(id.to_string())
    }
}

/// Key factory for skill queries.
pub mod skills {
    use super::*;

    pub fn all() -> QueryKey {
        QueryKey::root("skills")
    }

    pub fn lists() -> QueryKey {
        all().push("list")
    }

    pub fn list(filter: &str) -> QueryKey {
        lists().push(filter)
    }

    pub fn details() -> QueryKey {
        all().push("detail")
    }

    pub fn detail(id: Uuid) -> QueryKey {
        details().push(id.to_string())
    }

    /// Per-project attachment list.
    pub fn by_project(project_id: Uuid) -> QueryKey {
        all().push("by-project").push(project_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_is_hierarchical() {
        let id = Uuid::new_v4();
        assert!(portfolios::detail(id).starts_with(&portfolios::details()));
        assert!(portfolios::detail(id).starts_with(&portfolios::all()));
        assert!(!portfolios::detail(id).starts_with(&portfolios::lists()));
        assert!(!projects::all().starts_with(&portfolios::all()));
    }

    #[test]
    fn list_variants_share_the_lists_prefix() {
        assert!(portfolios::list("public").starts_with(&portfolios::lists()));
        assert!(portfolios::list("mine").starts_with(&portfolios::lists()));
    }
}
