//! Forking: copying an element into another namespace with its tags

use super::{add_tag, tags_of, IdentificationEngine};
use crate::graph::{
    ElementKind, GraphElement, GraphError, GraphResult, ShareLevel, TagRequest, Tags, Uri, UserUris,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fields of the clone that differ from its source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkOverrides {
    /// User the clone is created for
    pub owner: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub share_level: Option<ShareLevel>,
}

impl ForkOverrides {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_share_level(mut self, level: ShareLevel) -> Self {
        self.share_level = Some(level);
        self
    }
}

/// An element as a client last saw it, tags included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    #[serde(flatten)]
    pub element: GraphElement,
    pub identifications: Tags,
}

impl IdentificationEngine {
    /// Current state of an element and its tags
    pub fn snapshot(&self, uri: &Uri) -> GraphResult<ElementSnapshot> {
        self.store.with_session(|s| {
            let element = s
                .element(uri)?
                .ok_or_else(|| GraphError::ElementNotFound(uri.clone()))?;
            Ok(ElementSnapshot {
                element,
                identifications: tags_of(s, uri)?,
            })
        })
    }

    /// Create a copy of `source` for another user.
    ///
    /// Label and comment come from `cached` unless overridden. The clone is
    /// tagged with `source` itself, then with every tag in `cached`.
    pub fn fork(
        &self,
        source: &Uri,
        overrides: ForkOverrides,
        cached: &ElementSnapshot,
    ) -> GraphResult<GraphElement> {
        self.store.with_session(|s| {
            let kind = s
                .element_kind(source)?
                .ok_or_else(|| GraphError::ElementNotFound(source.clone()))?;
            let uris = UserUris::new(overrides.owner.as_str());
            let uri = match kind {
                ElementKind::Vertex => uris.generate_vertex_uri(),
                ElementKind::Schema => uris.generate_schema_uri(),
                other => {
                    return Err(GraphError::InvariantViolation(format!(
                        "{} elements cannot be forked",
                        other.as_str()
                    )))
                }
            };

            let cached_resource = &cached.element.resource;
            let mut clone = GraphElement::new(uri);
            clone.resource.label = overrides
                .label
                .unwrap_or_else(|| cached_resource.label.clone());
            clone.resource.comment = overrides
                .comment
                .unwrap_or_else(|| cached_resource.comment.clone());
            clone.share_level = overrides.share_level.unwrap_or_default();
            s.insert_element(kind, &clone)?;

            let provenance = TagRequest::new(source.clone())
                .with_label(cached_resource.label.clone())
                .with_comment(cached_resource.comment.clone());
            add_tag(s, clone.uri(), provenance)?;
            for tag in cached.identifications.values() {
                add_tag(s, clone.uri(), tag.to_request())?;
            }

            debug!(%source, clone = %clone.uri(), tags = cached.identifications.len(), "forked");
            Ok(clone)
        })
    }
}
