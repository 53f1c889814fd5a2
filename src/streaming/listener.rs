use crate::error::CopyFactoryError;
use crate::rest::types::{CopyFactoryStrategyStopout, CopyFactoryTransaction, CopyFactoryUserLogMessage};

use async_trait::async_trait;

/// Receiver of one event stream.
///
/// Callbacks for a single registration are never invoked concurrently: the
/// next poll starts only after the previous callback has returned.
#[async_trait]
pub trait StreamListener<T: Send + 'static>: Send + Sync {
    /// A batch of events, newest first. May be empty when a long poll expires.
    async fn on_event(&self, batch: Vec<T>);

    /// A poll failed. The stream keeps retrying unless the error is "not found".
    async fn on_error(&self, _error: &CopyFactoryError) {}
}

pub type TransactionListener = dyn StreamListener<CopyFactoryTransaction>;
pub type StopoutListener = dyn StreamListener<CopyFactoryStrategyStopout>;
pub type UserLogListener = dyn StreamListener<CopyFactoryUserLogMessage>;
