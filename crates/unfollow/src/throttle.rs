use std::time::Duration;

use rand::Rng as _;
use tracing::info;

const LOG_TARGET: &str = "unfollow::throttle";

/// Random delay applied before every outbound request
///
/// There is no shared budget between requests: every call independently
/// waits a uniformly distributed time in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    /// No delay at all
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::rng().random_range(self.min..=self.max)
    }

    /// Sleep for a freshly chosen delay, returning it
    pub async fn wait(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            info!(target: LOG_TARGET, delay_ms = delay.as_millis(), "Delaying request");
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Throttle;

    #[test]
    fn delay_stays_within_bounds() {
        let throttle = Throttle::new(Duration::from_millis(5), Duration::from_millis(15));

        for _ in 0..1000 {
            let delay = throttle.next_delay();
            assert!(Duration::from_millis(5) <= delay);
            assert!(delay <= Duration::from_millis(15));
        }
    }

    #[test]
    fn inverted_bounds_are_swapped() {
        let throttle = Throttle::new(Duration::from_secs(15), Duration::from_secs(5));

        assert_eq!(throttle.min(), Duration::from_secs(5));
        assert_eq!(throttle.max(), Duration::from_secs(15));
    }

    #[test]
    fn degenerate_range_is_fixed() {
        let throttle = Throttle::new(Duration::from_millis(7), Duration::from_millis(7));
        assert_eq!(throttle.next_delay(), Duration::from_millis(7));
    }

    #[test_log::test(tokio::test(flavor = "multi_thread"))]
    async fn disabled_throttle_does_not_sleep() {
        assert_eq!(Throttle::disabled().wait().await, Duration::ZERO);
    }
}
