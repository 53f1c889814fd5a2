use crate::rest::client::ApiClient;
use crate::rest::types::CopyFactoryStrategyStopout;
use crate::streaming::StreamingConfig;
use crate::streaming::listener::StopoutListener;
use crate::streaming::poll::{Cursor, PollJob, remove_listener};
use crate::streaming::registry::ListenerRegistry;

use std::sync::Arc;

const STOPOUT_STREAM_PATH: &str = "/users/current/stopouts/stream";

/// Selects which stopouts a listener receives and where the stream resumes.
#[derive(Debug, Clone, Default)]
pub struct StopoutFilter {
    pub subscriber_id: Option<String>,
    pub strategy_id: Option<String>,
    /// Deliver only stopouts after this sequence number.
    pub sequence_number: Option<i64>,
}

/// Stream of strategy stopout events.
#[derive(Debug, Clone)]
pub struct StopoutListenerManager {
    client: ApiClient,
    config: StreamingConfig,
    listeners: ListenerRegistry<CopyFactoryStrategyStopout>,
}

impl StopoutListenerManager {
    pub fn new(client: ApiClient, config: StreamingConfig) -> Self {
        Self {
            client,
            config,
            listeners: ListenerRegistry::new(),
        }
    }

    pub fn listeners(&self) -> &ListenerRegistry<CopyFactoryStrategyStopout> {
        &self.listeners
    }

    /// Returns the listener id. Requires a Tokio runtime.
    pub fn add_stopout_listener(&self, listener: Arc<StopoutListener>, filter: StopoutFilter) -> String {
        let mut filters = Vec::new();
        if let Some(subscriber_id) = &filter.subscriber_id {
            filters.push(("subscriberId".to_string(), subscriber_id.clone()));
        }
        if let Some(strategy_id) = &filter.strategy_id {
            filters.push(("strategyId".to_string(), strategy_id.clone()));
        }
        filters.push(("limit".to_string(), self.config.stopout_page_limit.to_string()));

        let subject_id = filter
            .subscriber_id
            .or(filter.strategy_id)
            .unwrap_or_else(|| "*".to_string());

        PollJob {
            stream: "stopouts",
            subject_id,
            path: STOPOUT_STREAM_PATH.to_string(),
            filters,
            cursor: filter.sequence_number.map(Cursor::Sequence),
            backoff: self.config.backoff(),
            client: self.client.clone(),
            registry: self.listeners.clone(),
        }
        .start(listener)
    }

    /// Stop a stopout stream. An in-flight poll is discarded.
    pub fn remove_stopout_listener(&self, listener_id: &str) {
        remove_listener(&self.listeners, "stopouts", listener_id);
    }

    /// Remove every listener and wait for the poll tasks to exit.
    pub async fn shutdown(&self) {
        self.listeners.shutdown().await;
    }
}
