//! Typed client-side data layer for the API: query-key namespaces, a
//! staleness-window cache, resource clients whose mutations keep the cache
//! coherent, and UI state kept separate from server data.

pub mod api;
pub mod cache;
pub mod keys;
pub mod state;

pub use api::{ClientError, FolioClient};
pub use cache::{CacheLookup, QueryCache};
pub use keys::QueryKey;
pub use state::{ResourceViewState, SortOrder, UiState, ViewMode};
