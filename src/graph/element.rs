//! Graph elements and their identity fields

use super::uri::Uri;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility tier of an element, ordered `Private < Friends < Public`.
///
/// Persisted as a small integer in the `shareLevel` property. A missing
/// value means `Private`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShareLevel {
    #[default]
    Private,
    Friends,
    Public,
}

impl ShareLevel {
    /// Integer stored in the `shareLevel` property
    pub fn index(self) -> i64 {
        match self {
            ShareLevel::Private => 10,
            ShareLevel::Friends => 20,
            ShareLevel::Public => 40,
        }
    }

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            10 => Some(ShareLevel::Private),
            20 => Some(ShareLevel::Friends),
            40 => Some(ShareLevel::Public),
            _ => None,
        }
    }
}

/// Kind of node stored in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Vertex,
    Edge,
    Meta,
    Schema,
    Property,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::Vertex => "vertex",
            ElementKind::Edge => "edge",
            ElementKind::Meta => "meta",
            ElementKind::Schema => "schema",
            ElementKind::Property => "property",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vertex" => Some(ElementKind::Vertex),
            "edge" => Some(ElementKind::Edge),
            "meta" => Some(ElementKind::Meta),
            "schema" => Some(ElementKind::Schema),
            "property" => Some(ElementKind::Property),
            _ => None,
        }
    }
}

/// An image attached to an element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub base64_for_small: String,
    pub url_for_bigger: String,
}

impl Image {
    pub fn new(base64_for_small: impl Into<String>, url_for_bigger: impl Into<String>) -> Self {
        Self {
            base64_for_small: base64_for_small.into(),
            url_for_bigger: url_for_bigger.into(),
        }
    }
}

/// Identity fields shared by every element: uri, label, comment, images
/// and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendlyResource {
    pub uri: Uri,
    pub label: String,
    pub comment: String,
    pub images: Vec<Image>,
    pub creation_date: DateTime<Utc>,
    pub last_modification_date: DateTime<Utc>,
}

impl FriendlyResource {
    /// A blank resource created now
    pub fn new(uri: Uri) -> Self {
        let now = now_millis();
        Self {
            uri,
            label: String::new(),
            comment: String::new(),
            images: Vec::new(),
            creation_date: now,
            last_modification_date: now,
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

    pub fn owner_username(&self) -> Option<&str> {
        self.uri.owner_username()
    }
}

/// A first-class domain node: vertex, edge, schema or property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphElement {
    #[serde(flatten)]
    pub resource: FriendlyResource,
    pub share_level: ShareLevel,
}

impl GraphElement {
    pub fn new(uri: Uri) -> Self {
        Self {
            resource: FriendlyResource::new(uri),
            share_level: ShareLevel::default(),
        }
    }

    pub fn uri(&self) -> &Uri {
        &self.resource.uri
    }

    pub fn label(&self) -> &str {
        &self.resource.label
    }
}

/// Where an element sits among its siblings and when it was last moved there
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortDates {
    pub sort_date: Option<DateTime<Utc>>,
    pub move_date: Option<DateTime<Utc>>,
}

/// Current time truncated to what the store keeps (epoch milliseconds).
pub fn now_millis() -> DateTime<Utc> {
    from_millis(Utc::now().timestamp_millis())
}

/// Epoch milliseconds to a timestamp, saturating at the epoch for
/// out-of-range values.
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}
