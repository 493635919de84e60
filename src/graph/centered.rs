//! Projection of an element the user has focused on

use super::element::ShareLevel;
use super::uri::Uri;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Breadcrumb context: related element uri to a short label
pub type CenterContext = BTreeMap<Uri, String>;

/// Color settings of an element, serialized as one JSON object
pub type Colors = BTreeMap<String, String>;

/// A "recently focused" element as returned by the ranking queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CenteredElement {
    pub uri: Uri,
    pub label: String,
    pub number_of_visits: u32,
    pub last_center_date: DateTime<Utc>,
    pub nb_references: Option<u32>,
    pub context: CenterContext,
    /// Empty when no colors were set
    pub colors: Colors,
    pub share_level: ShareLevel,
    pub is_pattern: bool,
}

/// State of a friendship between two users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Requested,
    Confirmed,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FriendshipStatus::Requested => "requested",
            FriendshipStatus::Confirmed => "confirmed",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}
