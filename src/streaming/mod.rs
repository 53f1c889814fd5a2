//! Long-poll event streams.
//!
//! Each registered listener gets its own background task that repeatedly
//! long-polls a stream endpoint, hands every batch to the listener and
//! resumes after the newest item it has seen. Failed polls are retried
//! with capped exponential backoff until the listener is removed; a
//! "not found" response removes the listener.

pub mod listener;
pub mod registry;
pub mod stopouts;
pub mod transactions;
pub mod user_log;

pub(crate) mod poll;

pub use listener::{StopoutListener, StreamListener, TransactionListener, UserLogListener};
pub use registry::ListenerRegistry;
pub use stopouts::{StopoutFilter, StopoutListenerManager};
pub use transactions::TransactionListenerManager;
pub use user_log::{StrategyLogFilter, SubscriberLogFilter, UserLogListenerManager};

use tokio::time::Duration;

/// Poll loop tuning.
///
/// # Default
///
/// - `error_backoff = 1s`, doubled after each consecutive failure up to `max_error_backoff = 30s`
/// - `long_poll_timeout = 180s`
/// - `transaction_page_limit = 1000`, `stopout_page_limit = 1000`
#[derive(Debug, Clone)]
pub struct StreamingConfig {
    pub error_backoff: Duration,
    pub max_error_backoff: Duration,
    /// Per-request timeout for stream requests, which the server holds open.
    pub long_poll_timeout: Duration,
    pub transaction_page_limit: u32,
    pub stopout_page_limit: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            error_backoff: Duration::from_secs(1),
            max_error_backoff: Duration::from_secs(30),
            long_poll_timeout: Duration::from_secs(180),
            transaction_page_limit: 1000,
            stopout_page_limit: 1000,
        }
    }
}

impl StreamingConfig {
    pub(crate) fn backoff(&self) -> poll::ErrorBackoff {
        poll::ErrorBackoff::new(self.error_backoff, self.max_error_backoff)
    }
}
