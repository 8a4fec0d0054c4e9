use snafu::Snafu;

use crate::User;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PageError {
    #[snafu(display("Page claims a next page, but carries no end cursor"))]
    MissingCursor,
}

pub type PageResult<T> = std::result::Result<T, PageError>;

/// One batch of followers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Total follower count, as reported by the server for this page
    pub count: u64,
    pub has_next_page: bool,
    /// Continuation token; only meaningful if `has_next_page` is set
    pub end_cursor: Option<String>,
    pub users: Vec<User>,
}

impl Page {
    /// Cursor to fetch the page after this one, if there is one
    pub fn next_cursor(&self) -> PageResult<Option<&str>> {
        if !self.has_next_page {
            return Ok(None);
        }

        match self.end_cursor.as_deref() {
            Some(cursor) if !cursor.is_empty() => Ok(Some(cursor)),
            _ => MissingCursorSnafu.fail(),
        }
    }
}
