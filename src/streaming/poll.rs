use crate::rest::client::ApiClient;
use crate::rest::types::{CopyFactoryStrategyStopout, CopyFactoryTransaction, CopyFactoryUserLogMessage};
use crate::streaming::listener::StreamListener;
use crate::streaming::registry::ListenerRegistry;
use crate::time::{format_time, parse_wire_time};

use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::time::{Duration, sleep};
use tracing::{debug, error, warn};

/// Exclusive lower bound for the next poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Cursor {
    Time(DateTime<Utc>),
    Sequence(i64),
}

impl Cursor {
    fn query_pair(&self) -> (String, String) {
        match self {
            Cursor::Time(time) => ("startTime".to_string(), format_time(time)),
            Cursor::Sequence(number) => ("previousSequenceNumber".to_string(), number.to_string()),
        }
    }
}

/// Event type carried by a stream, and how a raw batch advances the cursor.
///
/// The cursor is read from the undecoded records so a record this client
/// cannot decode still moves the stream forward.
pub(crate) trait StreamItem: DeserializeOwned + Send + 'static {
    fn resume_cursor(batch: &[Value]) -> Option<Cursor>;
}

fn after_newest(batch: &[Value]) -> Option<Cursor> {
    let time = parse_wire_time(batch.first()?.get("time")?)?;
    Some(Cursor::Time(time + TimeDelta::milliseconds(1)))
}

impl StreamItem for CopyFactoryTransaction {
    fn resume_cursor(batch: &[Value]) -> Option<Cursor> {
        after_newest(batch)
    }
}

impl StreamItem for CopyFactoryUserLogMessage {
    fn resume_cursor(batch: &[Value]) -> Option<Cursor> {
        after_newest(batch)
    }
}

impl StreamItem for CopyFactoryStrategyStopout {
    fn resume_cursor(batch: &[Value]) -> Option<Cursor> {
        batch
            .iter()
            .rev()
            .find_map(|item| item.get("sequenceNumber")?.as_i64())
            .map(Cursor::Sequence)
    }
}

/// Decode each record on its own, dropping the ones that do not match `T`.
fn decode_batch<T: StreamItem>(stream: &'static str, batch: Vec<Value>) -> Vec<T> {
    batch
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!(stream, error = %err, "skipping undecodable stream record");
                None
            }
        })
        .collect()
}

/// Capped exponential delay between failed polls.
#[derive(Debug, Clone)]
pub(crate) struct ErrorBackoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl ErrorBackoff {
    pub(crate) fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial;
    }

    /// Delay to wait now; the following call returns twice as much, up to the cap.
    pub(crate) fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self
            .current
            .checked_mul(2)
            .map_or(self.max, |next| next.min(self.max));
        delay
    }
}

/// Remove a registration, logging only when it was present.
pub(crate) fn remove_listener<T: Send + 'static>(
    registry: &ListenerRegistry<T>,
    stream: &'static str,
    listener_id: &str,
) {
    if registry.remove(listener_id) {
        debug!(stream, listener_id, "listener removed");
    }
}

/// One registration's poll loop.
pub(crate) struct PollJob<T: StreamItem> {
    pub(crate) stream: &'static str,
    pub(crate) subject_id: String,
    pub(crate) path: String,
    pub(crate) filters: Vec<(String, String)>,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) backoff: ErrorBackoff,
    pub(crate) client: ApiClient,
    pub(crate) registry: ListenerRegistry<T>,
}

impl<T: StreamItem> PollJob<T> {
    /// Register `listener` and spawn its poll loop. Requires a Tokio runtime.
    pub(crate) fn start(self, listener: Arc<dyn StreamListener<T>>) -> String {
        let registry = self.registry.clone();
        let id = registry.register(listener);
        debug!(stream = self.stream, subject_id = %self.subject_id, listener_id = %id, "listener added");

        let task = tokio::spawn(self.run(id.clone()));
        registry.attach(&id, task);
        id
    }

    async fn run(mut self, id: String) {
        while let Some(listener) = self.registry.listener(&id) {
            let mut query = self.filters.clone();
            if let Some(cursor) = &self.cursor {
                query.push(cursor.query_pair());
            }

            let result = self.client.get_extended::<Vec<Value>>(&self.path, query).await;
            if !self.registry.contains(&id) {
                return;
            }

            match result {
                Ok(batch) => {
                    let next = T::resume_cursor(&batch);
                    listener.on_event(decode_batch(self.stream, batch)).await;
                    self.backoff.reset();
                    if let Some(next) = next
                        && self.registry.contains(&id)
                    {
                        self.cursor = Some(next);
                    }
                }
                Err(err) if err.is_not_found() => {
                    listener.on_error(&err).await;
                    error!(
                        stream = self.stream,
                        subject_id = %self.subject_id,
                        listener_id = %id,
                        "subject not found, removing listener"
                    );
                    self.registry.remove(&id);
                }
                Err(err) => {
                    listener.on_error(&err).await;
                    let delay = self.backoff.next_delay();
                    error!(
                        stream = self.stream,
                        subject_id = %self.subject_id,
                        listener_id = %id,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %err,
                        "failed to retrieve event stream, retrying"
                    );
                    sleep(delay).await;
                }
            }
        }
        debug!(stream = self.stream, subject_id = %self.subject_id, listener_id = %id, "poll loop stopped");
    }
}
