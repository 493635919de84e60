//! Element identity layer: creation, properties and cascading removal

use crate::graph::{
    Colors, ElementKind, GraphElement, GraphError, GraphResult, Image, ShareLevel, SortDates, Uri,
    UserUris,
};
use crate::identification::remove_all_tags;
use crate::storage::{RelationKind, Session, SqliteStore, StorageError, TextProperty};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

/// CRUD over vertices, edges, schemas and properties
pub struct ElementOperator {
    store: Arc<SqliteStore>,
}

impl ElementOperator {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    pub fn create_vertex(&self, owner: &str) -> GraphResult<GraphElement> {
        let element = GraphElement::new(UserUris::new(owner).generate_vertex_uri());
        self.store
            .with_session(|s| insert(s, ElementKind::Vertex, element))
    }

    /// Create an edge between two existing vertices, owned by the source's owner
    pub fn create_edge(&self, source: &Uri, destination: &Uri) -> GraphResult<GraphElement> {
        self.store.with_session(|s| {
            expect_kind(s, source, ElementKind::Vertex)?;
            expect_kind(s, destination, ElementKind::Vertex)?;
            let owner = source
                .owner_username()
                .ok_or_else(|| GraphError::InvalidUri(source.to_string()))?;
            let edge = insert(
                s,
                ElementKind::Edge,
                GraphElement::new(UserUris::new(owner).generate_edge_uri()),
            )?;
            s.link(edge.uri(), RelationKind::SourceVertex, source, None)?;
            s.link(edge.uri(), RelationKind::DestinationVertex, destination, None)?;
            Ok(edge)
        })
    }

    pub fn create_schema(&self, owner: &str) -> GraphResult<GraphElement> {
        let element = GraphElement::new(UserUris::new(owner).generate_schema_uri());
        self.store
            .with_session(|s| insert(s, ElementKind::Schema, element))
    }

    /// Add a property to an existing schema
    pub fn add_property(&self, schema: &Uri) -> GraphResult<GraphElement> {
        self.store.with_session(|s| {
            expect_kind(s, schema, ElementKind::Schema)?;
            let owner = schema
                .owner_username()
                .ok_or_else(|| GraphError::InvalidUri(schema.to_string()))?;
            let property = insert(
                s,
                ElementKind::Property,
                GraphElement::new(UserUris::new(owner).generate_property_uri()),
            )?;
            s.link(schema, RelationKind::HasProperty, property.uri(), None)?;
            Ok(property)
        })
    }

    pub fn element(&self, uri: &Uri) -> GraphResult<GraphElement> {
        self.store.with_session(|s| {
            s.element(uri)?
                .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))
        })
    }

    pub fn set_label(&self, uri: &Uri, label: &str) -> GraphResult<()> {
        self.set_text(uri, TextProperty::Label, Some(label))
    }

    pub fn set_comment(&self, uri: &Uri, comment: &str) -> GraphResult<()> {
        self.set_text(uri, TextProperty::Comment, Some(comment))
    }

    /// Append images after the ones already attached
    pub fn add_images(&self, uri: &Uri, images: &[Image]) -> GraphResult<Vec<Image>> {
        self.store.with_session(|s| {
            let mut element = s
                .element(uri)?
                .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))?;
            element.resource.images.extend_from_slice(images);
            let json = serde_json::to_string(&element.resource.images)
                .map_err(StorageError::from)?;
            s.update_text(uri, TextProperty::Images, Some(&json))?;
            Ok(element.resource.images)
        })
    }

    pub fn set_share_level(&self, uri: &Uri, level: ShareLevel) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.set_share_level(uri, level)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }

    pub fn set_colors(&self, uri: &Uri, colors: &Colors) -> GraphResult<()> {
        let json = serde_json::to_string(colors).map_err(StorageError::from)?;
        self.set_text(uri, TextProperty::Colors, Some(&json))
    }

    /// Colors of an element; empty when none were set
    pub fn colors(&self, uri: &Uri) -> GraphResult<Colors> {
        match self.get_text(uri, TextProperty::Colors)? {
            Some(json) => Ok(serde_json::from_str(&json).map_err(StorageError::from)?),
            None => Ok(Colors::new()),
        }
    }

    pub fn set_children_indexes(&self, uri: &Uri, indexes: &str) -> GraphResult<()> {
        self.set_text(uri, TextProperty::ChildrenIndexes, Some(indexes))
    }

    pub fn children_indexes(&self, uri: &Uri) -> GraphResult<String> {
        Ok(self
            .get_text(uri, TextProperty::ChildrenIndexes)?
            .unwrap_or_default())
    }

    /// Record `vertex` as a sub-element of the group vertex `group`
    pub fn include_vertex(&self, group: &Uri, vertex: &Uri) -> GraphResult<()> {
        self.include(group, vertex, ElementKind::Vertex, RelationKind::IncludedVertex)
    }

    /// Record `edge` as a sub-element of the group vertex `group`
    pub fn include_edge(&self, group: &Uri, edge: &Uri) -> GraphResult<()> {
        self.include(group, edge, ElementKind::Edge, RelationKind::IncludedEdge)
    }

    /// Place an element among its siblings at `sort`, moved there at `moved`
    pub fn set_sort_date(
        &self,
        uri: &Uri,
        sort: DateTime<Utc>,
        moved: DateTime<Utc>,
    ) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.set_sort_date(uri, sort, moved)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }

    /// Position dates; both `None` until `set_sort_date` is called
    pub fn sort_date(&self, uri: &Uri) -> GraphResult<SortDates> {
        self.store.with_session(|s| {
            s.sort_date(uri)?
                .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))
        })
    }

    pub fn mark_as_pattern(&self, uri: &Uri) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.set_pattern(uri, true)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }

    /// Uri of an edge linking `vertex` and `other`, in either direction
    pub fn edge_between(&self, vertex: &Uri, other: &Uri) -> GraphResult<Uri> {
        self.store.with_session(|s| {
            s.incident_edges(vertex)?
                .into_iter()
                .find(|e| {
                    (&e.source == vertex && &e.destination == other)
                        || (&e.source == other && &e.destination == vertex)
                })
                .map(|e| e.edge)
                .ok_or_else(|| GraphError::EdgeNotFound {
                    vertex: vertex.clone(),
                    other: other.clone(),
                })
        })
    }

    /// Remove an element and everything that cannot outlive it.
    ///
    /// A vertex takes its edges along, a schema its properties. Tags are
    /// released before each element is deleted.
    pub fn remove(&self, uri: &Uri) -> GraphResult<()> {
        self.store.with_session(|s| remove(s, uri))
    }

    /// Remove several elements at once, each with the same cascade as `remove`.
    ///
    /// Every uri must exist when the call starts; otherwise nothing is
    /// removed. Elements already taken by an earlier cascade in the same
    /// call are skipped.
    pub fn remove_all(&self, uris: &[Uri]) -> GraphResult<()> {
        self.store.with_session(|s| {
            for uri in uris {
                if s.element_kind(uri)?.is_none() {
                    return Err(GraphError::ElementNotFound(uri.clone()));
                }
            }
            for uri in uris {
                if s.element_kind(uri)?.is_some() {
                    remove(s, uri)?;
                }
            }
            debug!(count = uris.len(), "removed elements");
            Ok(())
        })
    }

    fn include(
        &self,
        group: &Uri,
        member: &Uri,
        member_kind: ElementKind,
        relation: RelationKind,
    ) -> GraphResult<()> {
        self.store.with_session(|s| {
            expect_kind(s, group, ElementKind::Vertex)?;
            expect_kind(s, member, member_kind)?;
            s.link(group, relation, member, None)?;
            Ok(())
        })
    }

    fn set_text(&self, uri: &Uri, property: TextProperty, value: Option<&str>) -> GraphResult<()> {
        self.store.with_session(|s| {
            if !s.update_text(uri, property, value)? {
                return Err(GraphError::ElementNotFound(uri.clone()));
            }
            Ok(())
        })
    }

    fn get_text(&self, uri: &Uri, property: TextProperty) -> GraphResult<Option<String>> {
        self.store.with_session(|s| {
            s.text_property(uri, property)?
                .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))
        })
    }
}

fn insert(s: &Session<'_>, kind: ElementKind, element: GraphElement) -> GraphResult<GraphElement> {
    s.insert_element(kind, &element)?;
    debug!(uri = %element.uri(), kind = kind.as_str(), "created element");
    Ok(element)
}

fn expect_kind(s: &Session<'_>, uri: &Uri, kind: ElementKind) -> GraphResult<()> {
    match s.element_kind(uri)? {
        Some(found) if found == kind => Ok(()),
        Some(found) => Err(GraphError::InvariantViolation(format!(
            "{} is a {}, expected a {}",
            uri,
            found.as_str(),
            kind.as_str()
        ))),
        None => Err(GraphError::ElementNotFound(uri.clone())),
    }
}

fn remove(s: &Session<'_>, uri: &Uri) -> GraphResult<()> {
    let kind = s
        .element_kind(uri)?
        .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))?;
    match kind {
        ElementKind::Vertex => {
            for edge in s.incident_edges(uri)? {
                remove_single(s, &edge.edge)?;
            }
        }
        ElementKind::Schema => {
            for property in s.targets(uri, RelationKind::HasProperty)? {
                remove_single(s, &property)?;
            }
        }
        _ => {}
    }
    remove_single(s, uri)
}

fn remove_single(s: &Session<'_>, uri: &Uri) -> GraphResult<()> {
    remove_all_tags(s, uri)?;
    s.delete_resource(uri)?;
    debug!(%uri, "removed element");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{from_millis, MindGraph, TagRequest};

    #[test]
    fn edge_requires_existing_vertices() {
        let graph = MindGraph::in_memory().unwrap();
        let a = graph.elements().create_vertex("roger").unwrap();
        let missing = UserUris::new("roger").generate_vertex_uri();

        let err = graph.elements().create_edge(a.uri(), &missing).unwrap_err();
        assert!(matches!(err, GraphError::ElementNotFound(uri) if uri == missing));
    }

    #[test]
    fn edge_between_finds_either_direction() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let a = ops.create_vertex("roger").unwrap();
        let b = ops.create_vertex("roger").unwrap();
        let c = ops.create_vertex("roger").unwrap();
        let edge = ops.create_edge(a.uri(), b.uri()).unwrap();

        assert_eq!(&ops.edge_between(b.uri(), a.uri()).unwrap(), edge.uri());
        assert!(matches!(
            ops.edge_between(a.uri(), c.uri()),
            Err(GraphError::EdgeNotFound { .. })
        ));
    }

    #[test]
    fn properties_are_stored_and_read_back() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let v = ops.create_vertex("roger").unwrap();

        ops.set_label(v.uri(), "oak").unwrap();
        ops.set_comment(v.uri(), "a tree").unwrap();
        ops.set_share_level(v.uri(), ShareLevel::Friends).unwrap();
        ops.add_images(v.uri(), &[Image::new("b64", "https://example.org/oak.png")])
            .unwrap();
        let images = ops
            .add_images(v.uri(), &[Image::new("b64-2", "https://example.org/oak2.png")])
            .unwrap();
        assert_eq!(images.len(), 2);

        let stored = ops.element(v.uri()).unwrap();
        assert_eq!(stored.label(), "oak");
        assert_eq!(stored.resource.comment, "a tree");
        assert_eq!(stored.share_level, ShareLevel::Friends);
        assert_eq!(stored.resource.images[0].url_for_bigger, "https://example.org/oak.png");
    }

    #[test]
    fn colors_and_children_indexes_default_to_empty() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let v = ops.create_vertex("roger").unwrap();
        assert!(ops.colors(v.uri()).unwrap().is_empty());
        assert_eq!(ops.children_indexes(v.uri()).unwrap(), "");

        let colors = Colors::from([("background".to_string(), "#ffffff".to_string())]);
        ops.set_colors(v.uri(), &colors).unwrap();
        ops.set_children_indexes(v.uri(), "{\"a\":0}").unwrap();
        assert_eq!(ops.colors(v.uri()).unwrap(), colors);
        assert_eq!(ops.children_indexes(v.uri()).unwrap(), "{\"a\":0}");
    }

    #[test]
    fn removing_a_vertex_cascades_to_edges_and_releases_tags() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let tags = graph.identification();
        let a = ops.create_vertex("roger").unwrap();
        let b = ops.create_vertex("roger").unwrap();
        let edge = ops.create_edge(a.uri(), b.uri()).unwrap();
        let tree = tags
            .add_tag(a.uri(), TagRequest::new("https://example.org/tree"))
            .unwrap();
        tags.add_tag(edge.uri(), TagRequest::new("https://example.org/tree"))
            .unwrap();
        let identifier = tree[&Uri::from("https://example.org/tree")].uri().clone();
        assert_eq!(tags.identifier(&identifier).unwrap().nb_references, 2);

        ops.remove(a.uri()).unwrap();

        assert!(matches!(ops.element(a.uri()), Err(GraphError::ElementNotFound(_))));
        assert!(matches!(ops.element(edge.uri()), Err(GraphError::ElementNotFound(_))));
        assert!(ops.element(b.uri()).is_ok());
        assert_eq!(tags.identifier(&identifier).unwrap().nb_references, 0);
    }

    #[test]
    fn removing_a_schema_removes_its_properties() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let schema = ops.create_schema("roger").unwrap();
        let property = ops.add_property(schema.uri()).unwrap();

        ops.remove(schema.uri()).unwrap();
        assert!(matches!(
            ops.element(property.uri()),
            Err(GraphError::ElementNotFound(_))
        ));
    }

    #[test]
    fn sort_dates_start_unset_and_are_stored() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let v = ops.create_vertex("roger").unwrap();
        assert_eq!(ops.sort_date(v.uri()).unwrap(), SortDates::default());

        let sort = from_millis(5_000);
        let moved = from_millis(9_000);
        ops.set_sort_date(v.uri(), sort, moved).unwrap();
        let dates = ops.sort_date(v.uri()).unwrap();
        assert_eq!(dates.sort_date, Some(sort));
        assert_eq!(dates.move_date, Some(moved));

        let missing = UserUris::new("roger").generate_vertex_uri();
        assert!(matches!(
            ops.set_sort_date(&missing, sort, moved),
            Err(GraphError::ElementNotFound(_))
        ));
    }

    #[test]
    fn remove_all_cascades_for_every_uri() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let tags = graph.identification();
        let a = ops.create_vertex("roger").unwrap();
        let b = ops.create_vertex("roger").unwrap();
        let c = ops.create_vertex("roger").unwrap();
        let ab = ops.create_edge(a.uri(), b.uri()).unwrap();
        let bc = ops.create_edge(b.uri(), c.uri()).unwrap();
        let added = tags
            .add_tag(ab.uri(), TagRequest::new("https://example.org/tree"))
            .unwrap();
        let identifier = added[&Uri::from("https://example.org/tree")].uri().clone();

        // The edge is listed after the vertex whose cascade already took it
        ops.remove_all(&[a.uri().clone(), ab.uri().clone(), c.uri().clone()])
            .unwrap();

        for gone in [&a, &ab, &c, &bc] {
            assert!(matches!(ops.element(gone.uri()), Err(GraphError::ElementNotFound(_))));
        }
        assert!(ops.element(b.uri()).is_ok());
        assert_eq!(tags.identifier(&identifier).unwrap().nb_references, 0);
    }

    #[test]
    fn remove_all_leaves_everything_when_one_uri_is_missing() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let a = ops.create_vertex("roger").unwrap();
        let missing = UserUris::new("roger").generate_vertex_uri();

        let err = ops
            .remove_all(&[a.uri().clone(), missing.clone()])
            .unwrap_err();
        assert!(matches!(err, GraphError::ElementNotFound(uri) if uri == missing));
        assert!(ops.element(a.uri()).is_ok());
    }

    #[test]
    fn only_vertices_can_group() {
        let graph = MindGraph::in_memory().unwrap();
        let ops = graph.elements();
        let schema = ops.create_schema("roger").unwrap();
        let v = ops.create_vertex("roger").unwrap();
        let err = ops.include_vertex(schema.uri(), v.uri()).unwrap_err();
        assert!(matches!(err, GraphError::InvariantViolation(_)));
    }
}
