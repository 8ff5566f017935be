//! Resilience patterns for provider clients
//!
//! Provider calls are retried with a fixed delay, and only for capacity
//! errors (rate limits, exhausted quotas). Everything else fails fast so the
//! orchestrator can move on to the next provider.

mod retry;

pub use retry::{AttemptOutcome, RetryConfig, RetryExecutor};
