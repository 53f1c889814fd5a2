use crate::rest::client::ApiClient;
use crate::rest::types::CopyFactoryUserLogMessage;
use crate::streaming::StreamingConfig;
use crate::streaming::listener::UserLogListener;
use crate::streaming::poll::{Cursor, PollJob, remove_listener};
use crate::streaming::registry::ListenerRegistry;
use crate::types::LogLevel;

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Filters for a strategy log stream.
#[derive(Debug, Clone, Default)]
pub struct StrategyLogFilter {
    pub start_time: Option<DateTime<Utc>>,
    pub position_id: Option<String>,
    /// Minimum severity.
    pub level: Option<LogLevel>,
    pub limit: Option<u32>,
}

/// Filters for a subscriber log stream.
#[derive(Debug, Clone, Default)]
pub struct SubscriberLogFilter {
    pub start_time: Option<DateTime<Utc>>,
    pub strategy_id: Option<String>,
    pub position_id: Option<String>,
    /// Minimum severity.
    pub level: Option<LogLevel>,
    pub limit: Option<u32>,
}

fn log_filters(
    strategy_id: Option<&String>,
    position_id: Option<&String>,
    level: Option<LogLevel>,
    limit: Option<u32>,
) -> Vec<(String, String)> {
    let mut filters = Vec::new();
    if let Some(strategy_id) = strategy_id {
        filters.push(("strategyId".to_string(), strategy_id.clone()));
    }
    if let Some(position_id) = position_id {
        filters.push(("positionId".to_string(), position_id.clone()));
    }
    if let Some(level) = level {
        filters.push(("level".to_string(), level.as_str().to_string()));
    }
    if let Some(limit) = limit {
        filters.push(("limit".to_string(), limit.to_string()));
    }
    filters
}

/// Streams of copy trading user log records for strategies and subscribers.
#[derive(Debug, Clone)]
pub struct UserLogListenerManager {
    client: ApiClient,
    config: StreamingConfig,
    strategy_log_listeners: ListenerRegistry<CopyFactoryUserLogMessage>,
    subscriber_log_listeners: ListenerRegistry<CopyFactoryUserLogMessage>,
}

impl UserLogListenerManager {
    pub fn new(client: ApiClient, config: StreamingConfig) -> Self {
        Self {
            client,
            config,
            strategy_log_listeners: ListenerRegistry::new(),
            subscriber_log_listeners: ListenerRegistry::new(),
        }
    }

    pub fn strategy_log_listeners(&self) -> &ListenerRegistry<CopyFactoryUserLogMessage> {
        &self.strategy_log_listeners
    }

    pub fn subscriber_log_listeners(&self) -> &ListenerRegistry<CopyFactoryUserLogMessage> {
        &self.subscriber_log_listeners
    }

    /// Returns the listener id. Requires a Tokio runtime.
    pub fn add_strategy_log_listener(
        &self,
        listener: Arc<UserLogListener>,
        strategy_id: &str,
        filter: StrategyLogFilter,
    ) -> String {
        PollJob {
            stream: "strategy user log",
            subject_id: strategy_id.to_string(),
            path: format!("/users/current/strategies/{strategy_id}/user-log/stream"),
            filters: log_filters(None, filter.position_id.as_ref(), filter.level, filter.limit),
            cursor: filter.start_time.map(Cursor::Time),
            backoff: self.config.backoff(),
            client: self.client.clone(),
            registry: self.strategy_log_listeners.clone(),
        }
        .start(listener)
    }

    /// Returns the listener id. Requires a Tokio runtime.
    pub fn add_subscriber_log_listener(
        &self,
        listener: Arc<UserLogListener>,
        subscriber_id: &str,
        filter: SubscriberLogFilter,
    ) -> String {
        PollJob {
            stream: "subscriber user log",
            subject_id: subscriber_id.to_string(),
            path: format!("/users/current/subscribers/{subscriber_id}/user-log/stream"),
            filters: log_filters(
                filter.strategy_id.as_ref(),
                filter.position_id.as_ref(),
                filter.level,
                filter.limit,
            ),
            cursor: filter.start_time.map(Cursor::Time),
            backoff: self.config.backoff(),
            client: self.client.clone(),
            registry: self.subscriber_log_listeners.clone(),
        }
        .start(listener)
    }

    /// Stop a strategy log stream. An in-flight poll is discarded.
    pub fn remove_strategy_log_listener(&self, listener_id: &str) {
        remove_listener(&self.strategy_log_listeners, "strategy user log", listener_id);
    }

    /// Stop a subscriber log stream. An in-flight poll is discarded.
    pub fn remove_subscriber_log_listener(&self, listener_id: &str) {
        remove_listener(&self.subscriber_log_listeners, "subscriber user log", listener_id);
    }

    /// Remove every listener and wait for the poll tasks to exit.
    pub async fn shutdown(&self) {
        self.strategy_log_listeners.shutdown().await;
        self.subscriber_log_listeners.shutdown().await;
    }
}
