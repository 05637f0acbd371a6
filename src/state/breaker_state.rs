use crate::config::CircuitBreakerConfig;
use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;

/// Verdict for a call about to pass through the breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Circuit closed; call proceeds normally
    Closed,

    /// Cooldown elapsed; the circuit was reset and this call is the trial
    HalfOpen,

    /// Circuit open; the call must not reach the network
    Rejected { retry_in: Duration },
}

/// Failure-count state behind the circuit breaker
#[derive(Debug, Clone)]
pub struct BreakerState {
    pub failure_count: u32,
    pub last_failure_time: Option<Instant>,
    pub is_open: bool,
    threshold: u32,
    cooldown: Duration,
}

impl BreakerState {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            failure_count: 0,
            last_failure_time: None,
            is_open: false,
            threshold: config.failure_threshold,
            cooldown: config.cooldown(),
        }
    }

    /// Decides whether a call may proceed, half-opening after the cooldown
    pub fn admit(&mut self, now: Instant) -> Admission {
        if !self.is_open {
            return Admission::Closed;
        }

        let reopen_at = self
            .last_failure_time
            .map(|at| at + self.cooldown)
            .unwrap_or(now);

        if now < reopen_at {
            return Admission::Rejected {
                retry_in: reopen_at - now,
            };
        }

        self.is_open = false;
        self.failure_count = 0;
        Admission::HalfOpen
    }

    pub fn record_success(&mut self) {
        self.failure_count = 0;
        self.is_open = false;
    }

    /// Counts a failure and returns true if it opened the circuit
    pub fn record_failure(&mut self, now: Instant) -> bool {
        self.failure_count += 1;
        self.last_failure_time = Some(now);

        if !self.is_open && self.failure_count >= self.threshold {
            self.is_open = true;
            return true;
        }

        false
    }

    pub fn snapshot(&self, now: Instant) -> BreakerSnapshot {
        let open_for_ms = match (self.is_open, self.last_failure_time) {
            (true, Some(at)) => (at + self.cooldown).saturating_duration_since(now).as_millis() as u64,
            _ => 0,
        };

        BreakerSnapshot {
            failure_count: self.failure_count,
            is_open: self.is_open,
            open_for_ms,
        }
    }
}

/// Point-in-time view of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub failure_count: u32,
    pub is_open: bool,
    /// Remaining cooldown, zero when closed
    pub open_for_ms: u64,
}
