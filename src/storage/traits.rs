//! Storage trait definitions

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection lock poisoned")]
    LockPoisoned,

    #[error("Invalid shareLevel value: {0}")]
    InvalidShareLevel(i64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Extension trait for opening stores from paths
pub trait OpenStore: Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Relationship kinds persisted in the `relations` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// edge -> its source vertex
    SourceVertex,
    /// edge -> its destination vertex
    DestinationVertex,
    /// element -> identifier (tagging edge)
    IdentifiedTo,
    /// group vertex -> contained vertex
    IncludedVertex,
    /// group vertex -> contained edge
    IncludedEdge,
    /// schema -> property
    HasProperty,
}

impl RelationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::SourceVertex => "source_vertex",
            RelationKind::DestinationVertex => "destination_vertex",
            RelationKind::IdentifiedTo => "identified_to",
            RelationKind::IncludedVertex => "included_vertex",
            RelationKind::IncludedEdge => "included_edge",
            RelationKind::HasProperty => "has_property",
        }
    }
}
