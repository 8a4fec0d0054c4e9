use std::time::Duration;

use crate::throttle::Throttle;

/// Lower bound of the random delay before every request
pub const DEFAULT_THROTTLE_MIN: Duration = Duration::from_millis(5_000);
/// Upper bound of the random delay before every request
pub const DEFAULT_THROTTLE_MAX: Duration = Duration::from_millis(15_000);
/// Pause after the server signals rate limiting
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(15 * 60);
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Attempts per page (first try included) before a failed fetch ends the run
pub const DEFAULT_FETCH_ATTEMPTS: usize = 3;
/// Starting delay of the backoff between page fetch attempts
pub const DEFAULT_FETCH_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Knobs of a single run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub throttle_min: Duration,
    pub throttle_max: Duration,
    pub cooldown: Duration,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub fetch_attempts: usize,
    pub fetch_retry_delay: Duration,
    /// Stop after this many followers were removed
    pub max_removals: Option<usize>,
    /// Keep followers the owner has a pending follow request to
    pub spare_requested: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            throttle_min: DEFAULT_THROTTLE_MIN,
            throttle_max: DEFAULT_THROTTLE_MAX,
            cooldown: DEFAULT_COOLDOWN,
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fetch_attempts: DEFAULT_FETCH_ATTEMPTS,
            fetch_retry_delay: DEFAULT_FETCH_RETRY_DELAY,
            max_removals: None,
            spare_requested: false,
        }
    }
}

impl RunConfig {
    pub fn throttle(&self) -> Throttle {
        Throttle::new(self.throttle_min, self.throttle_max)
    }
}
