//! Folding fetched rows into a subgraph projection

use crate::graph::{
    EdgeInSubGraph, GraphElement, Identifier, IncludedEdge, IncludedElement, Subgraph, Uri,
    VertexInSubGraph,
};

/// Whether a row describes a vertex or an edge
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Vertex,
    Edge { source: Uri, destination: Uri },
}

/// Something hanging off an element that a row carries along
#[derive(Debug, Clone, PartialEq)]
pub enum AuxiliaryLink {
    Tag(Identifier),
    IncludedVertex(IncludedElement),
    IncludedEdge(IncludedEdge),
}

/// One fetched row: an element plus at most one auxiliary link
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub element: GraphElement,
    pub shape: Shape,
    pub link: Option<AuxiliaryLink>,
}

impl Row {
    pub fn vertex(element: GraphElement) -> Self {
        Self {
            element,
            shape: Shape::Vertex,
            link: None,
        }
    }

    pub fn edge(element: GraphElement, source: Uri, destination: Uri) -> Self {
        Self {
            element,
            shape: Shape::Edge {
                source,
                destination,
            },
            link: None,
        }
    }

    pub fn with_link(mut self, link: AuxiliaryLink) -> Self {
        self.link = Some(link);
        self
    }
}

/// Fold rows into a subgraph keyed by uri.
///
/// The first row seen for a uri creates its projection. Later rows for the
/// same uri only add their auxiliary link.
pub fn merge_rows(rows: impl IntoIterator<Item = Row>) -> Subgraph {
    let mut subgraph = Subgraph::new();
    for row in rows {
        let uri = row.element.uri().clone();
        match row.shape {
            Shape::Vertex => {
                let vertex = subgraph
                    .vertices
                    .entry(uri)
                    .or_insert_with(|| VertexInSubGraph::new(row.element));
                match row.link {
                    Some(AuxiliaryLink::Tag(tag)) => {
                        vertex
                            .identifications
                            .insert(tag.external_resource_uri.clone(), tag);
                    }
                    Some(AuxiliaryLink::IncludedVertex(included)) => {
                        vertex.included_vertices.insert(included.uri.clone(), included);
                    }
                    Some(AuxiliaryLink::IncludedEdge(included)) => {
                        vertex.included_edges.insert(included.uri.clone(), included);
                    }
                    None => {}
                }
            }
            Shape::Edge {
                source,
                destination,
            } => {
                let edge = subgraph
                    .edges
                    .entry(uri)
                    .or_insert_with(|| EdgeInSubGraph::new(row.element, source, destination));
                // Edges carry tags only
                if let Some(AuxiliaryLink::Tag(tag)) = row.link {
                    edge.identifications
                        .insert(tag.external_resource_uri.clone(), tag);
                }
            }
        }
    }
    subgraph
}
