use crate::rest::client::ApiClient;
use crate::rest::types::CopyFactoryTransaction;
use crate::streaming::StreamingConfig;
use crate::streaming::listener::TransactionListener;
use crate::streaming::poll::{Cursor, PollJob, remove_listener};
use crate::streaming::registry::ListenerRegistry;

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Streams of transactions on provided strategies and on subscriber accounts.
#[derive(Debug, Clone)]
pub struct TransactionListenerManager {
    client: ApiClient,
    config: StreamingConfig,
    strategy_listeners: ListenerRegistry<CopyFactoryTransaction>,
    subscriber_listeners: ListenerRegistry<CopyFactoryTransaction>,
}

impl TransactionListenerManager {
    pub fn new(client: ApiClient, config: StreamingConfig) -> Self {
        Self {
            client,
            config,
            strategy_listeners: ListenerRegistry::new(),
            subscriber_listeners: ListenerRegistry::new(),
        }
    }

    pub fn strategy_listeners(&self) -> &ListenerRegistry<CopyFactoryTransaction> {
        &self.strategy_listeners
    }

    pub fn subscriber_listeners(&self) -> &ListenerRegistry<CopyFactoryTransaction> {
        &self.subscriber_listeners
    }

    fn job(
        &self,
        stream: &'static str,
        subject_id: &str,
        path: String,
        start_time: Option<DateTime<Utc>>,
        registry: &ListenerRegistry<CopyFactoryTransaction>,
    ) -> PollJob<CopyFactoryTransaction> {
        PollJob {
            stream,
            subject_id: subject_id.to_string(),
            path,
            filters: vec![(
                "limit".to_string(),
                self.config.transaction_page_limit.to_string(),
            )],
            cursor: start_time.map(Cursor::Time),
            backoff: self.config.backoff(),
            client: self.client.clone(),
            registry: registry.clone(),
        }
    }

    /// Stream transactions of a strategy the user provides, starting at `start_time`.
    /// Returns the listener id. Requires a Tokio runtime.
    pub fn add_strategy_transaction_listener(
        &self,
        listener: Arc<TransactionListener>,
        strategy_id: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> String {
        self.job(
            "strategy transactions",
            strategy_id,
            format!("/users/current/strategies/{strategy_id}/transactions/stream"),
            start_time,
            &self.strategy_listeners,
        )
        .start(listener)
    }

    /// Stream transactions of a subscriber account, starting at `start_time`.
    /// Returns the listener id. Requires a Tokio runtime.
    pub fn add_subscriber_transaction_listener(
        &self,
        listener: Arc<TransactionListener>,
        subscriber_id: &str,
        start_time: Option<DateTime<Utc>>,
    ) -> String {
        self.job(
            "subscriber transactions",
            subscriber_id,
            format!("/users/current/subscribers/{subscriber_id}/transactions/stream"),
            start_time,
            &self.subscriber_listeners,
        )
        .start(listener)
    }

    /// Stop a strategy transaction stream. An in-flight poll is discarded.
    pub fn remove_strategy_transaction_listener(&self, listener_id: &str) {
        remove_listener(&self.strategy_listeners, "strategy transactions", listener_id);
    }

    /// Stop a subscriber transaction stream. An in-flight poll is discarded.
    pub fn remove_subscriber_transaction_listener(&self, listener_id: &str) {
        remove_listener(&self.subscriber_listeners, "subscriber transactions", listener_id);
    }

    /// Remove every listener and wait for the poll tasks to exit.
    pub async fn shutdown(&self) {
        self.strategy_listeners.shutdown().await;
        self.subscriber_listeners.shutdown().await;
    }
}
