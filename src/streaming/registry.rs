use crate::streaming::listener::StreamListener;
use crate::types::random_id;

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Length of generated listener ids.
pub const LISTENER_ID_LEN: usize = 10;

struct Registration<T: Send + 'static> {
    listener: Arc<dyn StreamListener<T>>,
    task: Option<JoinHandle<()>>,
}

/// Active registrations of one stream kind, keyed by listener id.
///
/// A poll task keeps running only while its id is present here.
pub struct ListenerRegistry<T: Send + 'static> {
    inner: Arc<Mutex<HashMap<String, Registration<T>>>>,
}

impl<T: Send + 'static> Clone for ListenerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

impl<T: Send + 'static> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Store `listener` under a fresh id.
    pub(crate) fn register(&self, listener: Arc<dyn StreamListener<T>>) -> String {
        let mut map = self.inner.lock();
        let id = loop {
            let id = random_id(LISTENER_ID_LEN);
            if !map.contains_key(&id) {
                break id;
            }
        };
        map.insert(
            id.clone(),
            Registration {
                listener,
                task: None,
            },
        );
        id
    }

    /// Retain the poll task handle. Dropped if the registration is already gone.
    pub(crate) fn attach(&self, id: &str, task: JoinHandle<()>) {
        if let Some(registration) = self.inner.lock().get_mut(id) {
            registration.task = Some(task);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().contains_key(id)
    }

    /// Listener stored under `id`, while it is still registered.
    pub(crate) fn listener(&self, id: &str) -> Option<Arc<dyn StreamListener<T>>> {
        self.inner
            .lock()
            .get(id)
            .map(|registration| Arc::clone(&registration.listener))
    }

    /// Remove a registration. The in-flight poll is not cancelled; its result is discarded.
    ///
    /// Returns whether the id was present.
    pub fn remove(&self, id: &str) -> bool {
        self.inner.lock().remove(id).is_some()
    }

    pub fn ids(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Remove every registration, abort the poll tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        let tasks: Vec<JoinHandle<()>> = self
            .inner
            .lock()
            .drain()
            .filter_map(|(_, registration)| registration.task)
            .collect();
        for task in &tasks {
            task.abort();
        }
        join_all(tasks).await;
    }
}
