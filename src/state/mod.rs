//! State module for tracking batch progress
//!
//! This module provides the plain state machines behind the shared services,
//! kept free of locking and clocks so each transition can be tested directly.
//!
//! # Components
//!
//! - `ItemStatus`: The outcome of one input row (success, skipped, blocked, etc.)
//! - `RateLimiterState`: Adaptive request spacing and block pauses
//! - `BreakerState`: Failure counting behind the circuit breaker

mod breaker_state;
mod item_state;
mod rate_state;

// Re-export main types
pub use breaker_state::{Admission, BreakerSnapshot, BreakerState};
pub use item_state::ItemStatus;
pub use rate_state::{RateLimiterState, RateSnapshot};
