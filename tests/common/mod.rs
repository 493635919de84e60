//! Shared fixtures for the integration tests
//!
//! Builds small mind maps over an in-memory store, keeping a name for every
//! vertex so tests can talk about "a" and "b" instead of uuids.

#![allow(dead_code)]

use mindgraph::{GraphElement, MindGraph, Uri};
use std::collections::HashMap;

/// A graph under construction with named vertices
pub struct MapBuilder {
    pub graph: MindGraph,
    owner: String,
    vertices: HashMap<String, GraphElement>,
    edges: Vec<GraphElement>,
}

impl MapBuilder {
    pub fn new(owner: &str) -> Self {
        Self {
            graph: MindGraph::in_memory().expect("in-memory store"),
            owner: owner.to_string(),
            vertices: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Add a vertex labelled `name` owned by the builder's owner
    pub fn vertex(mut self, name: &str) -> Self {
        self.add_vertex(name);
        self
    }

    /// Link two named vertices, creating them when missing
    pub fn edge(mut self, source: &str, destination: &str) -> Self {
        let source = self.add_vertex(source);
        let destination = self.add_vertex(destination);
        let edge = self
            .graph
            .elements()
            .create_edge(&source, &destination)
            .expect("create edge");
        self.edges.push(edge);
        self
    }

    /// Chain `names` with one edge between each consecutive pair
    pub fn chain(mut self, names: &[&str]) -> Self {
        for pair in names.windows(2) {
            self = self.edge(pair[0], pair[1]);
        }
        self
    }

    pub fn uri(&self, name: &str) -> Uri {
        self.vertices
            .get(name)
            .unwrap_or_else(|| panic!("no vertex named {}", name))
            .uri()
            .clone()
    }

    pub fn edges(&self) -> &[GraphElement] {
        &self.edges
    }

    fn add_vertex(&mut self, name: &str) -> Uri {
        if let Some(existing) = self.vertices.get(name) {
            return existing.uri().clone();
        }
        let ops = self.graph.elements();
        let vertex = ops.create_vertex(&self.owner).expect("create vertex");
        ops.set_label(vertex.uri(), name).expect("label vertex");
        let uri = vertex.uri().clone();
        self.vertices.insert(name.to_string(), vertex);
        uri
    }
}
