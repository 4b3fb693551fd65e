//! Read-time projection of a stored object.

use serde::{Deserialize, Serialize};

/// A single object within a bucket, as returned by the listing endpoint.
///
/// Built fresh from live provider state on every request and never persisted.
/// `is_public` is derived from the object's ACL at read time, so it can go
/// stale between listing and any later use of the URL.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectView {
    /// Display name from the object's `name` user-metadata field; `null`
    /// when the uploader never set one.
    pub name: Option<String>,

    /// Object key (the object's identity within its bucket).
    pub key: String,

    /// Provider-style URL for retrieving the object bytes.
    pub url: String,

    /// Whether the object's ACL grants read access to the all-users group.
    pub is_public: bool,
}
