//! Identifiers: shared, reference-counted semantic tags

use super::element::{FriendlyResource, Image};
use super::uri::Uri;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Relation used when a tagging edge does not carry its own
pub const DEFAULT_RELATION_EXTERNAL_URI: &str = "/identification";

/// Relation marking a tag as the type of the tagged element
pub const TYPE_RELATION_EXTERNAL_URI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

/// Relation marking a tag as an equivalent of the tagged element
pub const SAME_AS_RELATION_EXTERNAL_URI: &str = "http://www.w3.org/2002/07/owl#sameAs";

pub fn default_relation_external_uri() -> Uri {
    Uri::from(DEFAULT_RELATION_EXTERNAL_URI)
}

/// Tags of one element keyed by their external resource uri
pub type Tags = BTreeMap<Uri, Identifier>;

/// A tag node as seen through one tagging edge.
///
/// `relation_external_resource_uri` belongs to the edge, not the node: the
/// same identifier can play different roles on different elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(flatten)]
    pub resource: FriendlyResource,
    pub external_resource_uri: Uri,
    pub relation_external_resource_uri: Uri,
    pub nb_references: u32,
}

impl Identifier {
    pub fn uri(&self) -> &Uri {
        &self.resource.uri
    }

    /// Request to put this same tag on another element
    pub fn to_request(&self) -> TagRequest {
        TagRequest {
            external_resource_uri: self.external_resource_uri.clone(),
            relation_external_resource_uri: Some(self.relation_external_resource_uri.clone()),
            label: self.resource.label.clone(),
            comment: self.resource.comment.clone(),
            images: self.resource.images.clone(),
        }
    }

    pub fn is_type(&self) -> bool {
        self.relation_external_resource_uri.as_str() == TYPE_RELATION_EXTERNAL_URI
    }

    pub fn is_same_as(&self) -> bool {
        self.relation_external_resource_uri.as_str() == SAME_AS_RELATION_EXTERNAL_URI
    }
}

/// What a caller asks for when tagging an element.
///
/// `external_resource_uri` is either any resource (a new identifier is
/// created for it or an existing one reused) or the uri of an existing
/// identifier, which is then reused directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRequest {
    pub external_resource_uri: Uri,
    #[serde(default)]
    pub relation_external_resource_uri: Option<Uri>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub images: Vec<Image>,
}

impl TagRequest {
    pub fn new(external_resource_uri: impl Into<Uri>) -> Self {
        Self {
            external_resource_uri: external_resource_uri.into(),
            relation_external_resource_uri: None,
            label: String::new(),
            comment: String::new(),
            images: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn with_relation(mut self, relation: impl Into<Uri>) -> Self {
        self.relation_external_resource_uri = Some(relation.into());
        self
    }

    pub fn with_image(mut self, image: Image) -> Self {
        self.images.push(image);
        self
    }

    pub fn relation_or_default(&self) -> Uri {
        self.relation_external_resource_uri
            .clone()
            .unwrap_or_else(default_relation_external_uri)
    }
}
