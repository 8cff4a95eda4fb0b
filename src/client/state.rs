use std::collections::HashSet;
use uuid::Uuid;

/// How a resource collection is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    CreatedDesc,
    CreatedAsc,
    TitleAsc,
    TitleDesc,
}

/// UI state for one resource collection: filter, sort, view mode and
/// multi-selection. Deliberately decoupled from the query cache.
#[derive(Debug, Default)]
pub struct ResourceViewState {
    pub filter: String,
    pub sort: SortOrder,
    pub view_mode: ViewMode,
    selection: HashSet<Uuid>,
}

impl ResourceViewState {
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn toggle_selected(&mut self, id: Uuid) {
        if !self.selection.insert(id) {
            self.selection.remove(&id);
        }
    }

    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selection.contains(&id)
    }

    pub fn select_all(&mut self, ids: impl IntoIterator<Item = Uuid>) {
        self.selection.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selected(&self) -> Vec<Uuid> {
        self.selection.iter().copied().collect()
    }

    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }
}

/// Per-resource UI stores.
#[derive(Debug, Default)]
pub struct UiState {
    pub portfolios: ResourceViewState,
    pub projects: ResourceViewState,
    pub skills: ResourceViewState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_toggles() {
        let mut state = ResourceViewState::default();
        let id = Uuid::new_v4();
        state.toggle_selected(id);
        assert!(state.is_selected(id));
        state.toggle_selected(id);
        assert!(!state.is_selected(id));
    }

    #[test]
    fn select_all_then_clear() {
        let mut state = ResourceViewState::default();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        state.select_all(ids.clone());
        assert_eq!(state.selection_count(), 3);
        assert!(ids.iter().all(|id| state.is_selected(*id)));
        state.clear_selection();
        assert_eq!(state.selection_count(), 0);
    }

    #[test]
    fn filter_is_independent_of_selection() {
        let mut state = ResourceViewState::default();
        state.set_filter("rust");
        state.toggle_selected(Uuid::new_v4());
        state.clear_filter();
        assert_eq!(state.selection_count(), 1);
        assert!(state.filter.is_empty());
    }
}
