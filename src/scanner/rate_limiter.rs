//! Probe rate limiting.
//!
//! A token bucket shared by every host of a scan, so the configured rate is
//! the rate of the whole scan rather than of each host.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Caps how many probes per second a scan may launch.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<GovLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    per_second: NonZeroU32,
}

impl RateLimiter {
    /// Limit to `per_second` probes. Zero means unlimited and yields `None`.
    pub fn new(per_second: u32) -> Option<Self> {
        let per_second = NonZeroU32::new(per_second)?;
        Some(Self {
            limiter: Arc::new(GovLimiter::direct(Quota::per_second(per_second))),
            per_second,
        })
    }

    /// Wait until another probe may be launched.
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Take a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    pub fn per_second(&self) -> u32 {
        self.per_second.get()
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("per_second", &self.per_second)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_unlimited() {
        assert!(RateLimiter::new(0).is_none());
    }

    #[tokio::test]
    async fn test_first_token_is_immediate() {
        let limiter = RateLimiter::new(100).unwrap();
        assert!(limiter.try_acquire());
        limiter.wait().await;
        assert_eq!(limiter.per_second(), 100);
    }

    #[test]
    fn test_clones_share_the_bucket() {
        let limiter = RateLimiter::new(1).unwrap();
        let other = limiter.clone();
        assert!(limiter.try_acquire());
        assert!(!other.try_acquire());
    }
}
