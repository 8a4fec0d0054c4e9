//! Wire format of the follower enumeration endpoint

use serde::{Deserialize, Serialize};

use crate::{Page, User};

/// Selects the "followers of a user" query on the enumeration endpoint
pub const FOLLOWERS_QUERY_HASH: &str = "37479f2b8209594dde7facb0d904896a";

/// JSON-encoded into the `variables` query parameter
#[derive(Debug, Serialize)]
pub struct FollowersQueryVariables<'a> {
    pub id: &'a str,
    pub first: u32,
    /// Empty for the first page
    pub after: &'a str,
}

impl FollowersQueryVariables<'_> {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Deserialize)]
pub struct FollowersResponse {
    pub data: FollowersData,
}

#[derive(Debug, Deserialize)]
pub struct FollowersData {
    pub user: FollowersOwner,
}

#[derive(Debug, Deserialize)]
pub struct FollowersOwner {
    pub edge_followed_by: FollowedByConnection,
}

#[derive(Debug, Deserialize)]
pub struct FollowedByConnection {
    pub count: u64,
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<UserEdge>,
}

#[derive(Debug, Deserialize)]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserEdge {
    pub node: User,
}

impl From<FollowersResponse> for Page {
    fn from(response: FollowersResponse) -> Self {
        let connection = response.data.user.edge_followed_by;
        Self {
            count: connection.count,
            has_next_page: connection.page_info.has_next_page,
            end_cursor: connection.page_info.end_cursor,
            users: connection.edges.into_iter().map(|edge| edge.node).collect(),
        }
    }
}

impl FollowersResponse {
    pub fn from_json(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}
