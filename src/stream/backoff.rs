//! Reconnect delay schedule.
//!
//! Delays grow multiplicatively after consecutive transient failures and
//! snap back to the floor after any successful (re)connection. Whole
//! seconds only: growth is `floor(current * multiplier)`, clamped to the
//! ceiling, so the schedule from the 5s floor is
//! 5, 7, 10, 15, 22, 33, 49, 73, 109, 120, 120, ...

use std::time::Duration;

const MIN_DELAY_SECS: u64 = 5;
const MAX_DELAY_SECS: u64 = 120;
const MULTIPLIER: f64 = 1.5;

#[derive(Debug, Clone)]
pub struct Backoff {
    current_secs: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

impl Backoff {
    pub fn new() -> Self {
        Self {
            current_secs: MIN_DELAY_SECS,
        }
    }

    /// The delay to sleep before the next reconnect attempt.
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.current_secs)
    }

    /// Grow the delay after a transient failure. Held at the ceiling once
    /// reached.
    pub fn advance(&mut self) {
        let grown = (self.current_secs as f64 * MULTIPLIER).floor() as u64;
        self.current_secs = grown.min(MAX_DELAY_SECS);
    }

    /// Snap back to the floor after a successful connection.
    pub fn reset(&mut self) {
        self.current_secs = MIN_DELAY_SECS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_floor() {
        assert_eq!(Backoff::new().delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_deterministic_schedule() {
        let mut backoff = Backoff::new();
        let mut sleeps = Vec::new();
        for _ in 0..11 {
            sleeps.push(backoff.delay().as_secs());
            backoff.advance();
        }
        assert_eq!(sleeps, vec![5, 7, 10, 15, 22, 33, 49, 73, 109, 120, 120]);
    }

    #[test]
    fn test_two_failures_sleep_five_then_seven() {
        // 5 * 1.5 = 7.5, floored to 7.
        let mut backoff = Backoff::new();
        assert_eq!(backoff.delay(), Duration::from_secs(5));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(7));
    }

    #[test]
    fn test_held_at_ceiling() {
        let mut backoff = Backoff::new();
        for _ in 0..50 {
            backoff.advance();
        }
        assert_eq!(backoff.delay(), Duration::from_secs(120));
        backoff.advance();
        assert_eq!(backoff.delay(), Duration::from_secs(120));
    }

    #[test]
    fn test_reset_reverts_to_floor_regardless_of_depth() {
        let mut backoff = Backoff::new();
        for _ in 0..8 {
            backoff.advance();
        }
        assert_ne!(backoff.delay(), Duration::from_secs(5));
        backoff.reset();
        assert_eq!(backoff.delay(), Duration::from_secs(5));
    }
}
