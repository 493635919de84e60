//! MindGraph: entry point wiring the store to the domain engines

use super::uri::Uri;
use crate::admin::WholeGraphAdmin;
use crate::center::{CenterOperator, CenteredElementsQuery, Friendships};
use crate::config::Config;
use crate::element::ElementOperator;
use crate::extractor::SubGraphExtractor;
use crate::identification::IdentificationEngine;
use crate::storage::{OpenStore, SqliteStore, StorageError};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Element not found: {0}")]
    ElementNotFound(Uri),

    #[error("Identifier not found: {0}")]
    IdentifierNotFound(Uri),

    #[error("Element {element} is not tagged with identifier {identifier}")]
    TagNotFound { element: Uri, identifier: Uri },

    #[error("No edge links vertex {vertex} to vertex {other}")]
    EdgeNotFound { vertex: Uri, other: Uri },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid uri: {0}")]
    InvalidUri(String),

    #[error("Indexing failed: {0}")]
    Indexing(String),
}

impl From<rusqlite::Error> for GraphError {
    fn from(e: rusqlite::Error) -> Self {
        GraphError::Storage(StorageError::Database(e))
    }
}

/// Result type for domain operations
pub type GraphResult<T> = Result<T, GraphError>;

/// The main MindGraph handle
///
/// Cheap to clone; every engine it hands out shares the same store.
#[derive(Clone)]
pub struct MindGraph {
    store: Arc<SqliteStore>,
    config: Config,
}

impl MindGraph {
    pub fn new(store: Arc<SqliteStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Open the store configured in `config`
    pub fn open(config: Config) -> GraphResult<Self> {
        let store = SqliteStore::open(config.db_path())?;
        Ok(Self::new(Arc::new(store), config))
    }

    /// In-memory graph with default configuration (useful for testing)
    pub fn in_memory() -> GraphResult<Self> {
        let store = SqliteStore::open_in_memory()?;
        Ok(Self::new(Arc::new(store), Config::default()))
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn elements(&self) -> ElementOperator {
        ElementOperator::new(self.store.clone())
    }

    pub fn identification(&self) -> IdentificationEngine {
        IdentificationEngine::new(self.store.clone())
    }

    pub fn extractor(&self) -> SubGraphExtractor {
        SubGraphExtractor::new(self.store.clone())
    }

    pub fn centers(&self) -> CenterOperator {
        CenterOperator::new(self.store.clone())
    }

    /// Ranking queries paged with the configured page size
    pub fn centered_elements(&self) -> CenteredElementsQuery {
        CenteredElementsQuery::new(self.store.clone()).limit(self.config.page_size)
    }

    pub fn friendships(&self) -> Friendships {
        Friendships::new(self.store.clone())
    }

    pub fn admin(&self) -> WholeGraphAdmin {
        WholeGraphAdmin::new(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_graph_uses_default_page_size() {
        let graph = MindGraph::in_memory().unwrap();
        assert_eq!(graph.config().page_size, 28);
    }

    #[test]
    fn engines_share_one_store() {
        let graph = MindGraph::in_memory().unwrap();
        let vertex = graph.elements().create_vertex("roger").unwrap();
        let tags = graph.identification().get_tags(vertex.uri()).unwrap();
        assert!(tags.is_empty());
    }

    #[test]
    fn not_found_error_names_the_uri() {
        let err = GraphError::ElementNotFound(Uri::from("/service/users/a/graph/vertex/1"));
        assert_eq!(
            err.to_string(),
            "Element not found: /service/users/a/graph/vertex/1"
        );
    }
}
