//! Bounded subgraph extraction around a focus vertex
//!
//! Extraction runs in two phases. The fetch phase walks incident edges
//! outward from the focus for `depth` rounds inside one session and turns
//! everything it reaches into [`Row`]s. The projection phase merges those
//! rows and annotates each vertex with its shortest hop count, computed by
//! relaxation over the fetched adjacency alone.
//!
//! Edges are stored as intermediate nodes, so one logical hop is two store
//! steps (vertex to edge, edge to vertex); callers only ever see logical
//! hops.

mod merge;
mod relaxation;

pub use merge::{merge_rows, AuxiliaryLink, Row, Shape};
pub use relaxation::Adjacency;

use crate::graph::{ElementKind, GraphError, GraphResult, Subgraph, Uri};
use crate::storage::{EdgeEndpoints, Session, SqliteStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Extracts the neighborhood of a vertex
pub struct SubGraphExtractor {
    store: Arc<SqliteStore>,
}

/// Raw result of the fetch phase
struct Fetched {
    rows: Vec<Row>,
    adjacency: Adjacency<Uri>,
}

impl SubGraphExtractor {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Every vertex within `depth` hops of `focus`, and every edge touching
    /// a vertex closer than `depth`.
    pub fn extract(&self, focus: &Uri, depth: u32) -> GraphResult<Subgraph> {
        let fetched = self.store.with_session(|s| fetch(s, focus, depth))?;

        let distances = fetched.adjacency.shortest_distances(focus, depth);
        let mut subgraph = merge_rows(fetched.rows);
        for (uri, vertex) in subgraph.vertices.iter_mut() {
            match distances.get(uri) {
                Some(&distance) => {
                    vertex.relax_distance(distance);
                }
                None => {
                    return Err(GraphError::InvariantViolation(format!(
                        "fetched vertex {} is not within {} hops of {}",
                        uri, depth, focus
                    )))
                }
            }
        }

        debug!(
            %focus,
            depth,
            vertices = subgraph.vertex_count(),
            edges = subgraph.edge_count(),
            "extracted subgraph"
        );
        Ok(subgraph)
    }
}

fn fetch(s: &Session<'_>, focus: &Uri, depth: u32) -> GraphResult<Fetched> {
    match s.element_kind(focus)? {
        Some(ElementKind::Vertex) => {}
        Some(other) => {
            return Err(GraphError::InvariantViolation(format!(
                "focus {} is a {}, not a vertex",
                focus,
                other.as_str()
            )))
        }
        None => return Err(GraphError::ElementNotFound(focus.clone())),
    }

    let mut adjacency = Adjacency::new();
    adjacency.add_node(focus.clone());
    let mut vertices: BTreeSet<Uri> = BTreeSet::from([focus.clone()]);
    let mut edges: BTreeMap<Uri, EdgeEndpoints> = BTreeMap::new();
    let mut frontier = vec![focus.clone()];

    for _ in 0..depth {
        let mut next = Vec::new();
        for vertex in &frontier {
            for endpoints in s.incident_edges(vertex)? {
                if edges.contains_key(&endpoints.edge) {
                    continue;
                }
                adjacency.link(endpoints.source.clone(), endpoints.destination.clone());
                for end in [&endpoints.source, &endpoints.destination] {
                    if vertices.insert(end.clone()) {
                        next.push(end.clone());
                    }
                }
                edges.insert(endpoints.edge.clone(), endpoints);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }
    debug!(%focus, nodes = adjacency.node_count(), links = edges.len(), "fetched neighborhood");

    let mut rows = Vec::new();
    for uri in &vertices {
        let element = s
            .element(uri)?
            .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))?;
        rows.push(Row::vertex(element.clone()));
        for tag in s.tags_of(uri)? {
            rows.push(Row::vertex(element.clone()).with_link(AuxiliaryLink::Tag(tag)));
        }
        for included in s.included_vertices(uri)? {
            rows.push(Row::vertex(element.clone()).with_link(AuxiliaryLink::IncludedVertex(included)));
        }
        for included in s.included_edges(uri)? {
            rows.push(Row::vertex(element.clone()).with_link(AuxiliaryLink::IncludedEdge(included)));
        }
    }
    for endpoints in edges.values() {
        let element = s
            .element(&endpoints.edge)?
            .ok_or_else(|| GraphError::ElementNotFound(endpoints.edge.clone()))?;
        let row = || {
            Row::edge(
                element.clone(),
                endpoints.source.clone(),
                endpoints.destination.clone(),
            )
        };
        rows.push(row());
        for tag in s.tags_of(&endpoints.edge)? {
            rows.push(row().with_link(AuxiliaryLink::Tag(tag)));
        }
    }

    Ok(Fetched { rows, adjacency })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MindGraph;

    #[test]
    fn depth_zero_is_the_focus_alone() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let a = ops.create_vertex("roger").unwrap();
        let b = ops.create_vertex("roger").unwrap();
        ops.create_edge(a.uri(), b.uri()).unwrap();

        let subgraph = graph.extractor().extract(a.uri(), 0).unwrap();
        assert_eq!(subgraph.vertex_count(), 1);
        assert_eq!(subgraph.edge_count(), 0);
        assert_eq!(subgraph.distance_of(a.uri()), Some(0));
    }

    #[test]
    fn missing_focus_is_not_found() {
        let graph = MindGraph::in_memory().unwrap();
        let missing = crate::graph::UserUris::new("roger").generate_vertex_uri();
        let err = graph.extractor().extract(&missing, 1).unwrap_err();
        assert!(matches!(err, GraphError::ElementNotFound(_)));
    }

    #[test]
    fn edge_focus_is_rejected() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let a = ops.create_vertex("roger").unwrap();
        let b = ops.create_vertex("roger").unwrap();
        let edge = ops.create_edge(a.uri(), b.uri()).unwrap();
        let err = graph.extractor().extract(edge.uri(), 1).unwrap_err();
        assert!(matches!(err, GraphError::InvariantViolation(_)));
    }
}
