//! In-memory projection of a bounded neighborhood

use super::element::GraphElement;
use super::identifier::{Identifier, Tags};
use super::uri::Uri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A sub-element contained in a group vertex
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedElement {
    pub uri: Uri,
    pub label: String,
}

/// An edge contained in a group vertex, with both of its endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedEdge {
    pub uri: Uri,
    pub label: String,
    pub source_vertex: IncludedElement,
    pub destination_vertex: IncludedElement,
}

/// A vertex of an extracted subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VertexInSubGraph {
    #[serde(flatten)]
    pub element: GraphElement,
    /// Shortest hop count from the focus vertex; `None` until known
    pub min_distance_from_focus: Option<u32>,
    pub identifications: Tags,
    pub included_vertices: BTreeMap<Uri, IncludedElement>,
    pub included_edges: BTreeMap<Uri, IncludedEdge>,
}

impl VertexInSubGraph {
    pub fn new(element: GraphElement) -> Self {
        Self {
            element,
            min_distance_from_focus: None,
            identifications: Tags::new(),
            included_vertices: BTreeMap::new(),
            included_edges: BTreeMap::new(),
        }
    }

    pub fn uri(&self) -> &Uri {
        self.element.uri()
    }

    /// Record a distance, keeping the smaller of the known and new values.
    /// Returns whether the recorded distance changed.
    pub fn relax_distance(&mut self, distance: u32) -> bool {
        match self.min_distance_from_focus {
            Some(known) if known <= distance => false,
            _ => {
                self.min_distance_from_focus = Some(distance);
                true
            }
        }
    }

    pub fn types(&self) -> impl Iterator<Item = &Identifier> {
        self.identifications.values().filter(|i| i.is_type())
    }

    pub fn same_as(&self) -> impl Iterator<Item = &Identifier> {
        self.identifications.values().filter(|i| i.is_same_as())
    }
}

/// An edge of an extracted subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeInSubGraph {
    #[serde(flatten)]
    pub element: GraphElement,
    pub source_vertex_uri: Uri,
    pub destination_vertex_uri: Uri,
    pub identifications: Tags,
}

impl EdgeInSubGraph {
    pub fn new(element: GraphElement, source_vertex_uri: Uri, destination_vertex_uri: Uri) -> Self {
        Self {
            element,
            source_vertex_uri,
            destination_vertex_uri,
            identifications: Tags::new(),
        }
    }

    pub fn uri(&self) -> &Uri {
        self.element.uri()
    }

    /// The endpoint opposite to `vertex`, if `vertex` is one of them
    pub fn other_end(&self, vertex: &Uri) -> Option<&Uri> {
        if &self.source_vertex_uri == vertex {
            Some(&self.destination_vertex_uri)
        } else if &self.destination_vertex_uri == vertex {
            Some(&self.source_vertex_uri)
        } else {
            None
        }
    }
}

/// Vertices and edges keyed by uri, so neither can appear twice
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subgraph {
    pub vertices: BTreeMap<Uri, VertexInSubGraph>,
    pub edges: BTreeMap<Uri, EdgeInSubGraph>,
}

impl Subgraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex(&self, uri: &Uri) -> Option<&VertexInSubGraph> {
        self.vertices.get(uri)
    }

    pub fn edge(&self, uri: &Uri) -> Option<&EdgeInSubGraph> {
        self.edges.get(uri)
    }

    pub fn has_vertex(&self, uri: &Uri) -> bool {
        self.vertices.contains_key(uri)
    }

    pub fn has_edge(&self, uri: &Uri) -> bool {
        self.edges.contains_key(uri)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Distance of a vertex from the focus, if it is in the subgraph
    pub fn distance_of(&self, uri: &Uri) -> Option<u32> {
        self.vertices.get(uri).and_then(|v| v.min_distance_from_focus)
    }
}
