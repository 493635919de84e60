//! Element uris and the per-user namespace they embed

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const USERS_SEGMENT: &str = "/service/users/";
const IDENTIFIER_SEGMENT: &str = "/graph/identification/";

/// Globally unique identity of a graph element.
///
/// Serializes as a plain string. Uris minted by this crate look like
/// `/service/users/{username}/graph/{kind}/{uuid}`; uris of external
/// resources (a wikipedia page, a vocabulary term) are accepted as-is and
/// simply have no owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Uri(String);

impl Uri {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Username of the namespace this uri lives in, if any.
    pub fn owner_username(&self) -> Option<&str> {
        let start = self.0.find(USERS_SEGMENT)? + USERS_SEGMENT.len();
        let rest = &self.0[start..];
        let owner = rest.split('/').next()?;
        if owner.is_empty() {
            None
        } else {
            Some(owner)
        }
    }

    /// Whether this uri designates an identifier (tag) node.
    pub fn is_identifier_uri(&self) -> bool {
        self.owner_username().is_some() && self.0.contains(IDENTIFIER_SEGMENT)
    }

    /// Whether both uris live in the same user's namespace.
    pub fn same_owner_as(&self, other: &Uri) -> bool {
        match (self.owner_username(), other.owner_username()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Uri {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Uri {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Generates fresh uris inside one user's namespace.
#[derive(Debug, Clone)]
pub struct UserUris {
    username: String,
}

impl UserUris {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn graph_uri(&self) -> Uri {
        Uri(format!("{}{}/graph", USERS_SEGMENT, self.username))
    }

    pub fn generate_vertex_uri(&self) -> Uri {
        self.generate("vertex")
    }

    pub fn generate_edge_uri(&self) -> Uri {
        self.generate("edge")
    }

    pub fn generate_identifier_uri(&self) -> Uri {
        self.generate("identification")
    }

    pub fn generate_schema_uri(&self) -> Uri {
        self.generate("schema")
    }

    pub fn generate_property_uri(&self) -> Uri {
        self.generate("property")
    }

    fn generate(&self, kind: &str) -> Uri {
        Uri(format!(
            "{}/{}/{}",
            self.graph_uri().as_str(),
            kind,
            Uuid::new_v4()
        ))
    }
}
