//! Process-wide rate controller
//!
//! This module handles:
//! - Minimum spacing between request starts across all workers
//! - Full pauses after the remote signals blocking
//! - Growing and shrinking the spacing from response verdicts

use crate::config::RateLimitConfig;
use crate::state::{RateLimiterState, RateSnapshot};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Shared gate every fetch passes through before touching the network
///
/// The lock is held only while reading or updating the state. Waiting happens
/// outside it: a caller reserves its slot, releases the lock, then sleeps
/// until the slot starts.
#[derive(Debug)]
pub struct RateController {
    state: Mutex<RateLimiterState>,
}

impl RateController {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            state: Mutex::new(RateLimiterState::new(config)),
        }
    }

    /// Waits until this caller may issue its request
    pub async fn wait_turn(&self) {
        let now = Instant::now();
        let (start, blocked) = {
            let mut state = self.lock();
            (state.reserve_slot(now), state.is_blocked(now))
        };

        if start > now {
            if blocked {
                tracing::info!(
                    "Block pause in effect, next request in {:.1}s",
                    (start - now).as_secs_f64()
                );
            } else {
                tracing::debug!("Rate gate: waiting {:?}", start - now);
            }
            tokio::time::sleep_until(start).await;
        }
    }

    /// Returns true while a block pause holds back every request
    pub fn is_blocked(&self) -> bool {
        self.lock().is_blocked(Instant::now())
    }

    /// Records whether the last response was a block signal
    pub fn report_outcome(&self, blocked: bool) {
        let now = Instant::now();
        let mut state = self.lock();
        state.report_outcome(blocked, now, &mut rand::thread_rng());

        if blocked {
            let pause = state
                .blocked_until
                .map(|until| until.saturating_duration_since(now))
                .unwrap_or_default();
            tracing::warn!(
                "Block signal #{}: pausing all requests for {:.0}s, spacing now {:.1}s",
                state.consecutive_failures,
                pause.as_secs_f64(),
                state.current_delay.as_secs_f64()
            );
        }
    }

    pub fn snapshot(&self) -> RateSnapshot {
        self.lock().snapshot(Instant::now())
    }

    fn lock(&self) -> MutexGuard<'_, RateLimiterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
