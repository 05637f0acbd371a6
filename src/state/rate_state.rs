use crate::config::RateLimitConfig;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Adaptive spacing state shared by every fetch in a batch run
///
/// All transitions take `now` explicitly so the state can be driven from a
/// paused clock in tests. `current_delay` always stays within
/// `[min_delay, max_delay]`.
#[derive(Debug, Clone)]
pub struct RateLimiterState {
    /// Start of the most recently reserved request slot
    pub last_request_time: Option<Instant>,

    /// Minimum spacing between request starts
    pub current_delay: Duration,

    /// Block signals seen since the last clean response
    pub consecutive_failures: u32,

    /// No request may start before this instant
    pub blocked_until: Option<Instant>,

    min_delay: Duration,
    max_delay: Duration,
    block_pause_min_ms: u64,
    block_pause_max_ms: u64,
}

impl RateLimiterState {
    /// Creates a fresh state starting at the minimum delay
    pub fn new(config: &RateLimitConfig) -> Self {
        let min_delay = Duration::from_millis(config.min_delay_ms);

        Self {
            last_request_time: None,
            current_delay: min_delay,
            consecutive_failures: 0,
            blocked_until: None,
            min_delay,
            max_delay: Duration::from_millis(config.max_delay_ms),
            block_pause_min_ms: config.block_pause_min_ms,
            block_pause_max_ms: config.block_pause_max_ms,
        }
    }

    /// Reserves the next request slot and returns when it starts
    ///
    /// The slot starts no earlier than `blocked_until` and no earlier than
    /// `current_delay` after the previously reserved slot. The reservation is
    /// recorded immediately, so concurrent callers queue up behind each other
    /// even though they wait independently.
    pub fn reserve_slot(&mut self, now: Instant) -> Instant {
        let mut start = now;

        if let Some(until) = self.blocked_until {
            start = start.max(until);
        }

        if let Some(last) = self.last_request_time {
            start = start.max(last + self.current_delay);
        }

        self.last_request_time = Some(start);
        start
    }

    /// Adjusts the spacing after a response verdict
    ///
    /// # Arguments
    ///
    /// * `blocked` - Whether the remote signalled blocking
    /// * `now` - The current time instant
    /// * `rng` - Source for the random block pause
    pub fn report_outcome<R: Rng + ?Sized>(&mut self, blocked: bool, now: Instant, rng: &mut R) {
        if blocked {
            self.current_delay = self.current_delay.saturating_mul(2).min(self.max_delay);
            self.consecutive_failures += 1;

            let pause_ms = rng.gen_range(self.block_pause_min_ms..=self.block_pause_max_ms);
            self.blocked_until = Some(now + Duration::from_millis(pause_ms.max(1)));
        } else {
            self.consecutive_failures = 0;
            self.current_delay = self.current_delay.mul_f64(0.9).max(self.min_delay);
        }
    }

    /// Returns true while a block pause is in effect
    pub fn is_blocked(&self, now: Instant) -> bool {
        self.blocked_until.is_some_and(|until| until > now)
    }

    pub fn snapshot(&self, now: Instant) -> RateSnapshot {
        RateSnapshot {
            current_delay_ms: self.current_delay.as_millis() as u64,
            consecutive_failures: self.consecutive_failures,
            blocked_for_ms: self
                .blocked_until
                .map(|until| until.saturating_duration_since(now).as_millis() as u64)
                .unwrap_or(0),
        }
    }
}

/// Point-in-time view of the rate limiter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateSnapshot {
    pub current_delay_ms: u64,
    pub consecutive_failures: u32,
    /// Remaining block pause, zero when not blocked
    pub blocked_for_ms: u64,
}
