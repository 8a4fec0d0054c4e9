/// Result of a single attempt to remove a follower
///
/// Transport errors never leave the remover; they are collapsed into one of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Follower removed
    Success,
    /// Can't be removed, move on to the next one
    PermanentFailure,
    /// Server asked us to slow down; the same follower must be retried
    RetryRateLimited,
}

impl Outcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}
