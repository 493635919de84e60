//! Storage backend for MindGraph
//!
//! The domain engines never see SQL. They open a [`Session`] through
//! [`SqliteStore::with_session`] and call its typed primitives; ranking
//! queries are assembled with the [`SelectQuery`] builder.

mod session;
mod sqlite;
pub mod statement;
mod traits;

pub use session::{EdgeEndpoints, Session, TextProperty};
pub(crate) use session::json_column;
pub use sqlite::SqliteStore;
pub use statement::{BuiltQuery, Column, Predicate, SelectQuery};
pub use traits::{OpenStore, RelationKind, StorageError, StorageResult};
