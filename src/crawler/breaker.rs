//! Circuit breaker around the fetch client

use crate::config::CircuitBreakerConfig;
use crate::state::{Admission, BreakerSnapshot, BreakerState};
use crate::FetchError;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

/// Short-circuits fetches after repeated remote failures
///
/// Only failures that say something about the remote count: see
/// [`FetchError::is_remote_failure`].
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: &CircuitBreakerConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::new(config)),
        }
    }

    /// Runs `operation` unless the circuit is open
    ///
    /// # Returns
    ///
    /// * `Err(FetchError::CircuitOpen)` - The circuit is open and the cooldown
    ///   has not elapsed; `operation` was not started
    /// * Otherwise whatever `operation` returned
    pub async fn call<T, F, Fut>(&self, operation: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let admission = self.lock().admit(Instant::now());
        match admission {
            Admission::Rejected { retry_in } => {
                tracing::debug!("Circuit open, rejecting call ({:?} until trial)", retry_in);
                return Err(FetchError::CircuitOpen);
            }
            Admission::HalfOpen => {
                tracing::info!("Circuit breaker cooldown elapsed, attempting trial request");
            }
            Admission::Closed => {}
        }

        // A panic counts as a failure, then keeps unwinding to the caller
        let result = match AssertUnwindSafe(operation()).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                self.record_failure();
                std::panic::resume_unwind(panic);
            }
        };

        match &result {
            Ok(_) => self.lock().record_success(),
            Err(e) if e.is_remote_failure() => self.record_failure(),
            Err(_) => {}
        }

        result
    }

    fn record_failure(&self) {
        let mut state = self.lock();
        if state.record_failure(Instant::now()) {
            tracing::warn!(
                "Circuit breaker opened after {} consecutive failures",
                state.failure_count
            );
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        self.lock().snapshot(Instant::now())
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
