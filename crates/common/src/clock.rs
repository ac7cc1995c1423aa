//! Timing utilities for best-effort presence traffic.
//!
//! Presence messages (playhead position, heartbeats) are fire-and-forget;
//! this module provides the rate limiting and backoff arithmetic they share.

use std::time::{Duration, Instant};

/// Leading-edge rate limiter.
///
/// The first call always fires; afterwards at most one call fires per
/// `interval`. Suppressed calls are dropped, not deferred.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_fired: Option<Instant>,
}

impl Throttle {
    /// Create a throttle allowing one event per `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_fired: None,
        }
    }

    /// Check whether an event at `now` may fire.
    /// Returns true and updates internal state if ready.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        match self.last_fired {
            None => {
                self.last_fired = Some(now);
                true
            }
            Some(last) if now.saturating_duration_since(last) >= self.interval => {
                self.last_fired = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Forget the last firing so the next event goes through immediately.
    pub fn reset(&mut self) {
        self.last_fired = None;
    }
}

/// Exponential backoff: `base * 2^attempt`, saturating instead of overflowing.
pub fn exponential_backoff(base: Duration, attempt: u32) -> Duration {
    let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_throttle_first_call_fires() {
        let mut throttle = Throttle::new(Duration::from_millis(200));
        assert!(throttle.should_fire(Instant::now()));
    }

    #[test]
    fn test_throttle_drops_within_interval() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(200));
        assert!(throttle.should_fire(start));
        assert!(!throttle.should_fire(start + Duration::from_millis(50)));
        assert!(!throttle.should_fire(start + Duration::from_millis(199)));
        assert!(throttle.should_fire(start + Duration::from_millis(200)));
        assert!(!throttle.should_fire(start + Duration::from_millis(350)));
        assert!(throttle.should_fire(start + Duration::from_millis(401)));
    }

    #[test]
    fn test_throttle_reset() {
        let start = Instant::now();
        let mut throttle = Throttle::new(Duration::from_millis(200));
        assert!(throttle.should_fire(start));
        throttle.reset();
        assert!(throttle.should_fire(start + Duration::from_millis(1)));
    }

    #[test]
    fn test_exponential_backoff() {
        let base = Duration::from_millis(1000);
        assert_eq!(exponential_backoff(base, 0), Duration::from_millis(1000));
        assert_eq!(exponential_backoff(base, 1), Duration::from_millis(2000));
        assert_eq!(exponential_backoff(base, 9), Duration::from_millis(512_000));
        assert_eq!(exponential_backoff(base, 64), base.saturating_mul(u32::MAX));
    }
}
