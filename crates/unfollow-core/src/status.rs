use std::fmt;

use crate::User;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    InProgress,
    /// Pagination exhausted, or the removal cap was reached
    Completed,
    /// Stopped by an unrecoverable page fetch failure
    Failed,
    /// Stopped by a shutdown request
    Interrupted,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunStatus::InProgress => "in progress",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Interrupted => "interrupted",
        })
    }
}

/// Aggregate state of a single run
///
/// The number of removed followers is always the length of the removed list,
/// so there is no separate counter to keep in sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessStatus {
    total_followers: u64,
    status: RunStatus,
    unfollowed: Vec<User>,
    skipped: u64,
    failed: u64,
    rate_limited: u64,
    pages_fetched: u64,
}

impl ProcessStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_followers(&self) -> u64 {
        self.total_followers
    }

    pub fn count_unfollowed(&self) -> usize {
        self.unfollowed.len()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Removed followers, in the order they were removed
    pub fn unfollowed(&self) -> &[User] {
        &self.unfollowed
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn failed(&self) -> u64 {
        self.failed
    }

    pub fn rate_limited(&self) -> u64 {
        self.rate_limited
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    pub fn record_page(&mut self, total_followers: u64) {
        self.total_followers = total_followers;
        self.pages_fetched += 1;
    }

    pub fn record_unfollowed(&mut self, user: User) {
        self.unfollowed.push(user);
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_rate_limited(&mut self) {
        self.rate_limited += 1;
    }

    pub fn finish(&mut self, status: RunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status: {}, followers: {}, unfollowed: {}, skipped: {}, failed: {}, rate limited: {}, pages: {}",
            self.status,
            self.total_followers,
            self.count_unfollowed(),
            self.skipped,
            self.failed,
            self.rate_limited,
            self.pages_fetched,
        )
    }
}
