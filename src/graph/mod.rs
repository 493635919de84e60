//! Core graph data structures

mod centered;
mod element;
mod engine;
mod identifier;
mod subgraph;
mod uri;

pub use centered::{CenterContext, CenteredElement, Colors, FriendshipStatus};
pub use element::{
    from_millis, now_millis, ElementKind, FriendlyResource, GraphElement, Image, ShareLevel,
    SortDates,
};
pub use engine::{GraphError, GraphResult, MindGraph};
pub use identifier::{
    default_relation_external_uri, Identifier, TagRequest, Tags, DEFAULT_RELATION_EXTERNAL_URI,
    SAME_AS_RELATION_EXTERNAL_URI, TYPE_RELATION_EXTERNAL_URI,
};
pub use subgraph::{EdgeInSubGraph, IncludedEdge, IncludedElement, Subgraph, VertexInSubGraph};
pub use uri::{Uri, UserUris};
