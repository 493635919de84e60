//! Identification engine: reference-counted tags and their propagation
//!
//! Tagging an element attaches it to an [`Identifier`] standing for some
//! external resource. Identifiers are shared: an existing one is reused
//! whenever the external resource already has one, and `nb_references`
//! always equals the number of tagging edges pointing at it.
//!
//! When the tagged resource is another element of the same user, the two
//! elements converge: the original's tags are copied onto the tagging
//! element, and a freshly created identifier is added back onto the
//! original. Both steps run from an explicit worklist and never fan out
//! further than one hop.

mod fork;

pub use fork::{ElementSnapshot, ForkOverrides};

use crate::graph::{
    FriendlyResource, GraphError, GraphResult, Identifier, TagRequest, Tags, Uri, UserUris,
};
use crate::storage::{RelationKind, Session, SqliteStore};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tag operations over one store
pub struct IdentificationEngine {
    store: Arc<SqliteStore>,
}

impl IdentificationEngine {
    pub fn new(store: Arc<SqliteStore>) -> Self {
        Self { store }
    }

    /// Tag `element` and propagate to its original when it references one.
    ///
    /// Returns the tags this call put on (or confirmed for) `element`,
    /// keyed by external resource uri, as they stand after propagation.
    /// A request naming an identifier uri is keyed by that identifier's
    /// external resource uri, not by the requested uri, so the result
    /// lines up with [`get_tags`](Self::get_tags).
    pub fn add_tag(&self, element: &Uri, tag: TagRequest) -> GraphResult<Tags> {
        self.store.with_session(|s| add_tag(s, element, tag))
    }

    /// Remove one tagging edge and return the identifier's remaining count
    pub fn remove_tag(&self, element: &Uri, identifier: &Uri) -> GraphResult<u32> {
        self.store.with_session(|s| {
            if !s.unlink(element, RelationKind::IdentifiedTo, identifier)? {
                return Err(if s.element_kind(element)?.is_none() {
                    GraphError::ElementNotFound(element.clone())
                } else {
                    GraphError::TagNotFound {
                        element: element.clone(),
                        identifier: identifier.clone(),
                    }
                });
            }
            let remaining = release_reference(s, identifier)?;
            debug!(%element, %identifier, remaining, "tag removed");
            Ok(remaining)
        })
    }

    /// Current tags of `element`
    pub fn get_tags(&self, element: &Uri) -> GraphResult<Tags> {
        self.store.with_session(|s| {
            if s.element_kind(element)?.is_none() {
                return Err(GraphError::ElementNotFound(element.clone()));
            }
            tags_of(s, element)
        })
    }

    /// Load one identifier node
    pub fn identifier(&self, uri: &Uri) -> GraphResult<Identifier> {
        self.store.with_session(|s| {
            s.identifier(uri)?
                .ok_or_else(|| GraphError::IdentifierNotFound(uri.clone()))
        })
    }

    /// Delete every identifier no element is tagged with any more
    pub fn sweep_unreferenced(&self) -> GraphResult<Vec<Uri>> {
        self.store.with_session(|s| sweep_unreferenced(s))
    }
}

/// One pending tagging in the propagation worklist
struct Pending {
    target: Uri,
    request: TagRequest,
    propagate: bool,
}

/// Outcome of putting one tag on one element
struct Attached {
    identifier: Identifier,
    /// The identifier did not exist before this tagging
    created: bool,
}

pub(crate) fn add_tag(s: &Session<'_>, element: &Uri, tag: TagRequest) -> GraphResult<Tags> {
    if s.element_kind(element)?.is_none() {
        return Err(GraphError::ElementNotFound(element.clone()));
    }

    let mut reported: HashSet<Uri> = HashSet::new();
    let mut visited: HashSet<(Uri, Uri)> = HashSet::new();
    let mut worklist = VecDeque::from([Pending {
        target: element.clone(),
        request: tag,
        propagate: true,
    }]);

    while let Some(item) = worklist.pop_front() {
        let key = (item.target.clone(), item.request.external_resource_uri.clone());
        if !visited.insert(key) {
            continue;
        }

        let attached = attach(s, &item.target, &item.request)?;
        if &item.target == element {
            reported.insert(attached.identifier.external_resource_uri.clone());
        }
        if !item.propagate {
            continue;
        }

        let original = &item.request.external_resource_uri;
        if original == &item.target || !original.same_owner_as(&item.target) {
            continue;
        }
        if s.element_kind(original)?.is_none() {
            warn!(%original, target = %item.target, "referenced element is gone, not propagating");
            continue;
        }

        let present = tags_of(s, &item.target)?;
        for other in s.tags_of(original)? {
            if &item.target == element {
                reported.insert(other.external_resource_uri.clone());
            }
            if !present.contains_key(&other.external_resource_uri) {
                debug!(target = %item.target, tag = %other.external_resource_uri, "copying tag of original");
                worklist.push_back(Pending {
                    target: item.target.clone(),
                    request: other.to_request(),
                    propagate: false,
                });
            }
        }

        if attached.created {
            debug!(%original, identifier = %attached.identifier.uri(), "tagging original back");
            worklist.push_back(Pending {
                target: original.clone(),
                request: item.request.clone(),
                propagate: false,
            });
        }
    }

    let mut current = tags_of(s, element)?;
    current.retain(|external, _| reported.contains(external));
    Ok(current)
}

/// Put one tag on `target`, reusing or creating its identifier
fn attach(s: &Session<'_>, target: &Uri, request: &TagRequest) -> GraphResult<Attached> {
    let relation = request.relation_or_default();
    let requested = &request.external_resource_uri;

    let resolved = if requested.is_identifier_uri() {
        let identifier = s
            .identifier(requested)?
            .ok_or_else(|| GraphError::IdentifierNotFound(requested.clone()))?;
        Some(identifier)
    } else {
        s.identifier_by_external_uri(requested)?
    };

    let external = resolved
        .as_ref()
        .map(|i| i.external_resource_uri.clone())
        .unwrap_or_else(|| requested.clone());

    // Already tagged with this resource: only the edge's relation changes
    if let Some(mut existing) = s.tag_for_external_uri(target, &external)? {
        s.link(target, RelationKind::IdentifiedTo, existing.uri(), Some(&relation))?;
        existing.relation_external_resource_uri = relation;
        return Ok(Attached {
            identifier: existing,
            created: false,
        });
    }

    let (mut identifier, created) = match resolved {
        Some(identifier) => {
            debug!(%target, identifier = %identifier.uri(), "reusing identifier");
            (identifier, false)
        }
        None => {
            let owner = target
                .owner_username()
                .ok_or_else(|| GraphError::InvalidUri(target.to_string()))?;
            let mut resource = FriendlyResource::new(UserUris::new(owner).generate_identifier_uri())
                .with_label(request.label.clone())
                .with_comment(request.comment.clone());
            resource.images = request.images.clone();
            let identifier = Identifier {
                resource,
                external_resource_uri: external.clone(),
                relation_external_resource_uri: relation.clone(),
                nb_references: 0,
            };
            s.insert_identifier(&identifier)?;
            debug!(%target, identifier = %identifier.uri(), %external, "created identifier");
            (identifier, true)
        }
    };

    s.link(target, RelationKind::IdentifiedTo, identifier.uri(), Some(&relation))?;
    identifier.nb_references = s
        .add_to_nb_references(identifier.uri(), 1)?
        .ok_or_else(|| GraphError::IdentifierNotFound(identifier.uri().clone()))?;
    identifier.relation_external_resource_uri = relation;
    Ok(Attached {
        identifier,
        created,
    })
}

/// Tags on `element` keyed by external resource uri
pub(crate) fn tags_of(s: &Session<'_>, element: &Uri) -> GraphResult<Tags> {
    Ok(s
        .tags_of(element)?
        .into_iter()
        .map(|tag| (tag.external_resource_uri.clone(), tag))
        .collect())
}

/// Drop one reference from an identifier whose tagging edge is already gone
fn release_reference(s: &Session<'_>, identifier: &Uri) -> GraphResult<u32> {
    match s.add_to_nb_references(identifier, -1)? {
        Some(remaining) => Ok(remaining),
        None if s.nb_references(identifier)?.is_none() => {
            Err(GraphError::IdentifierNotFound(identifier.clone()))
        }
        None => Err(GraphError::InvariantViolation(format!(
            "reference count of {} would drop below zero",
            identifier
        ))),
    }
}

/// Remove every tagging edge of `element`, releasing each identifier
pub(crate) fn remove_all_tags(s: &Session<'_>, element: &Uri) -> GraphResult<()> {
    for tag in s.tags_of(element)? {
        s.unlink(element, RelationKind::IdentifiedTo, tag.uri())?;
        release_reference(s, tag.uri())?;
    }
    Ok(())
}

pub(crate) fn sweep_unreferenced(s: &Session<'_>) -> GraphResult<Vec<Uri>> {
    let unreferenced = s.identifiers_with_zero_references()?;
    for uri in &unreferenced {
        s.delete_resource(uri)?;
    }
    info!(removed = unreferenced.len(), "swept unreferenced identifiers");
    Ok(unreferenced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MindGraph, TYPE_RELATION_EXTERNAL_URI};

    const TREE: &str = "https://en.wikipedia.org/wiki/Tree";

    #[test]
    fn fresh_uri_creates_one_identifier() {
        let graph = MindGraph::in_memory().unwrap();
        let vertex = graph.elements().create_vertex("roger").unwrap();

        let tags = graph
            .identification()
            .add_tag(vertex.uri(), TagRequest::new(TREE).with_label("tree"))
            .unwrap();

        assert_eq!(tags.len(), 1);
        let tag = &tags[&Uri::from(TREE)];
        assert_eq!(tag.nb_references, 1);
        assert_eq!(tag.resource.label, "tree");
        assert_eq!(tag.uri().owner_username(), Some("roger"));
        assert!(tag.uri().is_identifier_uri());
    }

    #[test]
    fn retagging_updates_the_relation_in_place() {
        let graph = MindGraph::in_memory().unwrap();
        let engine = graph.identification();
        let vertex = graph.elements().create_vertex("roger").unwrap();

        engine.add_tag(vertex.uri(), TagRequest::new(TREE)).unwrap();
        let tags = engine
            .add_tag(
                vertex.uri(),
                TagRequest::new(TREE).with_relation(TYPE_RELATION_EXTERNAL_URI),
            )
            .unwrap();

        let tag = &tags[&Uri::from(TREE)];
        assert_eq!(tag.nb_references, 1);
        assert!(tag.is_type());
        assert_eq!(engine.get_tags(vertex.uri()).unwrap().len(), 1);
    }

    #[test]
    fn identifier_is_shared_between_elements() {
        let graph = MindGraph::in_memory().unwrap();
        let engine = graph.identification();
        let a = graph.elements().create_vertex("roger").unwrap();
        let b = graph.elements().create_vertex("ann").unwrap();

        let first = engine.add_tag(a.uri(), TagRequest::new(TREE)).unwrap();
        let second = engine.add_tag(b.uri(), TagRequest::new(TREE)).unwrap();

        let key = Uri::from(TREE);
        assert_eq!(first[&key].uri(), second[&key].uri());
        assert_eq!(second[&key].nb_references, 2);
    }

    #[test]
    fn tagging_with_an_identifier_uri_reuses_it() {
        let graph = MindGraph::in_memory().unwrap();
        let engine = graph.identification();
        let a = graph.elements().create_vertex("roger").unwrap();
        let b = graph.elements().create_vertex("roger").unwrap();

        let tags = engine.add_tag(a.uri(), TagRequest::new(TREE)).unwrap();
        let identifier = tags[&Uri::from(TREE)].uri().clone();

        let tags = engine
            .add_tag(b.uri(), TagRequest::new(identifier.clone()))
            .unwrap();
        let tag = &tags[&Uri::from(TREE)];
        assert_eq!(tag.uri(), &identifier);
        assert_eq!(tag.nb_references, 2);
    }

    #[test]
    fn unknown_identifier_uri_is_not_found() {
        let graph = MindGraph::in_memory().unwrap();
        let vertex = graph.elements().create_vertex("roger").unwrap();
        let missing = UserUris::new("roger").generate_identifier_uri();

        let err = graph
            .identification()
            .add_tag(vertex.uri(), TagRequest::new(missing))
            .unwrap_err();
        assert!(matches!(err, GraphError::IdentifierNotFound(_)));
    }

    #[test]
    fn remove_decrements_by_one_and_rejects_a_missing_edge() {
        let graph = MindGraph::in_memory().unwrap();
        let engine = graph.identification();
        let a = graph.elements().create_vertex("roger").unwrap();
        let b = graph.elements().create_vertex("ann").unwrap();
        engine.add_tag(a.uri(), TagRequest::new(TREE)).unwrap();
        let tags = engine.add_tag(b.uri(), TagRequest::new(TREE)).unwrap();
        let identifier = tags[&Uri::from(TREE)].uri().clone();

        assert_eq!(engine.remove_tag(a.uri(), &identifier).unwrap(), 1);
        let err = engine.remove_tag(a.uri(), &identifier).unwrap_err();
        assert!(matches!(err, GraphError::TagNotFound { .. }));
        assert_eq!(engine.identifier(&identifier).unwrap().nb_references, 1);
    }

    #[test]
    fn sweep_removes_only_unreferenced_identifiers() {
        let graph = MindGraph::in_memory().unwrap();
        let engine = graph.identification();
        let vertex = graph.elements().create_vertex("roger").unwrap();
        let kept = engine.add_tag(vertex.uri(), TagRequest::new(TREE)).unwrap();
        let dropped = engine
            .add_tag(vertex.uri(), TagRequest::new("https://example.org/bush"))
            .unwrap();
        let dropped = dropped[&Uri::from("https://example.org/bush")].uri().clone();
        engine.remove_tag(vertex.uri(), &dropped).unwrap();

        assert_eq!(engine.sweep_unreferenced().unwrap(), vec![dropped.clone()]);
        assert!(matches!(
            engine.identifier(&dropped),
            Err(GraphError::IdentifierNotFound(_))
        ));
        let kept = kept[&Uri::from(TREE)].uri().clone();
        assert!(engine.identifier(&kept).is_ok());
    }
}
