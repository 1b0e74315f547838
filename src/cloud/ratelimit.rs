//! Per-action request pacing
//!
//! The vendor enforces request quotas per API action. Each action gets its
//! own slot schedule: a call reserves the next free slot and sleeps until
//! it arrives. Reservation happens under the lock; sleeping does not.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Default requests per second for any action
pub const DEFAULT_RATE: u32 = 20;

/// Shared limiter, cheap to clone
#[derive(Clone, Debug)]
pub struct RateLimiter {
    default_rate: u32,
    overrides: Arc<HashMap<String, u32>>,
    next_slot: Arc<Mutex<HashMap<String, Instant>>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE, HashMap::new())
    }
}

impl RateLimiter {
    /// Create a limiter with a default rate and per-action overrides.
    /// A rate of 0 disables pacing for that action.
    pub fn new(default_rate: u32, overrides: HashMap<String, u32>) -> Self {
        Self {
            default_rate,
            overrides: Arc::new(overrides),
            next_slot: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// A limiter that never waits
    pub fn disabled() -> Self {
        Self::new(0, HashMap::new())
    }

    fn interval(&self, action: &str) -> Option<Duration> {
        let rate = self
            .overrides
            .get(action)
            .copied()
            .unwrap_or(self.default_rate);
        if rate == 0 {
            None
        } else {
            Some(Duration::from_secs(1) / rate)
        }
    }

    /// Wait until `action` may be called again
    pub async fn check(&self, action: &str) {
        let Some(interval) = self.interval(action) else {
            return;
        };

        let slot = {
            let mut slots = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = slots
                .get(action)
                .copied()
                .filter(|next| *next > now)
                .unwrap_or(now);
            slots.insert(action.to_string(), slot + interval);
            slot
        };

        if slot > Instant::now() {
            tracing::trace!("rate limit: delaying {} by {:?}", action, slot - Instant::now());
            tokio::time::sleep_until(slot).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_never_waits() {
        let limiter = RateLimiter::disabled();
        let start = Instant::now();
        for _ in 0..50 {
            limiter.check("DescribeAccounts").await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_paces_same_action() {
        let limiter = RateLimiter::new(100, HashMap::new());
        let start = Instant::now();
        for _ in 0..4 {
            limiter.check("DescribeAccounts").await;
        }
        // First call is immediate, the next three wait 10ms each
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn test_actions_are_independent() {
        let mut overrides = HashMap::new();
        overrides.insert("CreateAccount".to_string(), 1);
        let limiter = RateLimiter::new(0, overrides);

        limiter.check("CreateAccount").await;
        let start = Instant::now();
        limiter.check("DeleteAccount").await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
