//! Per-IP submission rate limiting.
//!
//! Process-local and best-effort: state is lost on restart and is not
//! shared between instances.

mod limiter;

pub use limiter::{RateDecision, RateLimiter, sweeper_worker};
