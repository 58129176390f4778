//! # Fibonacci Backoff
//!
//! Requeue delays for failed reconciliations. Grows more slowly than an
//! exponential backoff so a flapping tracker is retried reasonably soon while
//! a persistent outage settles at the cap.
//!
//! Sequence with the defaults: 1m, 1m, 2m, 3m, 5m, 8m, 10m, 10m, ...
//!
//! ```rust
//! use github_issue_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 10);
//! let minutes: Vec<u64> = (0..8).map(|_| backoff.next_backoff().as_secs() / 60).collect();
//! assert_eq!(minutes, vec![1, 1, 2, 3, 5, 8, 10, 10]);
//! ```

use std::time::Duration;

/// Fibonacci sequence of delays, in whole minutes, capped at a maximum
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    max_minutes: u64,
    prev_minutes: u64,
    current_minutes: u64,
}

impl FibonacciBackoff {
    /// `min_minutes` is used for the first two steps, `max_minutes` caps the sequence
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        let max_minutes = max_minutes.max(min_minutes);
        Self {
            max_minutes,
            prev_minutes: 0,
            current_minutes: min_minutes,
        }
    }

    /// Current delay; advances the sequence
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Duration::from_secs(self.current_minutes * 60);
        let next = self.prev_minutes.saturating_add(self.current_minutes);
        self.prev_minutes = self.current_minutes;
        self.current_minutes = next.min(self.max_minutes);
        delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_stays_at_cap() {
        let mut backoff = FibonacciBackoff::new(1, 10);
        for _ in 0..6 {
            let _ = backoff.next_backoff();
        }
        for _ in 0..20 {
            assert_eq!(backoff.next_backoff(), Duration::from_secs(600));
        }
    }

    #[test]
    fn test_max_below_min_is_clamped() {
        let mut backoff = FibonacciBackoff::new(3, 1);
        assert_eq!(backoff.next_backoff(), Duration::from_secs(180));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(180));
    }
}
