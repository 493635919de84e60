//! MindGraph: domain engine for a collaborative mind-mapping knowledge graph
//!
//! Sits on a transactional graph store and gives it the semantics a mind map
//! needs beyond plain CRUD.
//!
//! # Core Concepts
//!
//! - **Identifiers**: shared, reference-counted tags. Tagging an element
//!   with another element of the same user makes the two converge.
//! - **Subgraphs**: the neighborhood of a focus vertex up to a hop depth,
//!   each vertex annotated with its shortest distance to the focus.
//! - **Centered elements**: what users recently focused on, ranked by
//!   recency and filtered by ownership, share level and friendship.
//!
//! # Example
//!
//! ```
//! use mindgraph::{MindGraph, TagRequest};
//!
//! let graph = MindGraph::in_memory().unwrap();
//! let oak = graph.elements().create_vertex("roger").unwrap();
//! let tags = graph
//!     .identification()
//!     .add_tag(oak.uri(), TagRequest::new("https://en.wikipedia.org/wiki/Oak"))
//!     .unwrap();
//! assert_eq!(tags.len(), 1);
//!
//! let subgraph = graph.extractor().extract(oak.uri(), 1).unwrap();
//! assert_eq!(subgraph.vertex_count(), 1);
//! ```

pub mod admin;
pub mod center;
pub mod config;
pub mod element;
pub mod extractor;
mod graph;
pub mod identification;
pub mod storage;

pub use admin::{GraphIndexer, ReindexReport, WholeGraphAdmin};
pub use center::{CenterOperator, CenteredElementsQuery, Friendships, DEFAULT_PAGE_SIZE};
pub use config::{Config, ConfigError, LogFormat};
pub use element::ElementOperator;
pub use extractor::SubGraphExtractor;
pub use graph::{
    default_relation_external_uri, from_millis, now_millis, CenterContext, CenteredElement,
    Colors, EdgeInSubGraph, ElementKind, FriendlyResource, FriendshipStatus, GraphElement,
    GraphError, GraphResult, Identifier, Image, IncludedEdge, IncludedElement, MindGraph,
    ShareLevel, SortDates, Subgraph, TagRequest, Tags, Uri, UserUris, VertexInSubGraph,
    DEFAULT_RELATION_EXTERNAL_URI, SAME_AS_RELATION_EXTERNAL_URI, TYPE_RELATION_EXTERNAL_URI,
};
pub use identification::{ElementSnapshot, ForkOverrides, IdentificationEngine};
pub use storage::{OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
