use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, stable account identifier as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single follower of the account owner
///
/// Relationship flags are a snapshot taken when the page was fetched, and can
/// be stale by the time the follower is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_pic_url: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    /// The owner follows this user
    pub followed_by_viewer: bool,
    /// This user follows the owner
    pub follows_viewer: bool,
    /// The owner has a pending follow request to this user
    #[serde(default)]
    pub requested_by_viewer: bool,
}

impl User {
    /// Both sides follow each other
    pub fn is_mutual(&self) -> bool {
        self.followed_by_viewer && self.follows_viewer
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.username, self.id)
    }
}
