use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::{KeyValueStore, StorageError};

const EVENT_CAPACITY: usize = 64;

/// Identifies one handle family ("tab") opened on a shared backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabId(u64);

/// Emitted after every write through a [`Storage`] handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed; `None` when the whole store was cleared.
    pub key: Option<String>,
    pub origin: TabId,
}

/// Handle onto the persisted store for one tab.
///
/// Clones share the tab identity. [`Storage::open_tab`] creates a sibling
/// handle with a new identity on the same backend and event channel, whose
/// writes the first tab's [`StorageWatcher`]s will observe.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    events: broadcast::Sender<StorageEvent>,
    next_tab: Arc<AtomicU64>,
    tab: TabId,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").field("tab", &self.tab).finish()
    }
}

impl Storage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            events,
            next_tab: Arc::new(AtomicU64::new(1)),
            tab: TabId(0),
        }
    }

    #[must_use]
    pub fn open_tab(&self) -> Self {
        let id = self.next_tab.fetch_add(1, Ordering::Relaxed);
        Self {
            backend: Arc::clone(&self.backend),
            events: self.events.clone(),
            next_tab: Arc::clone(&self.next_tab),
            tab: TabId(id),
        }
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Raw string value for `key`. Read failures are logged and read as absent.
    #[must_use]
    pub fn get_raw(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed; treating as absent");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend rejects the write. No event is
    /// emitted in that case.
    pub fn set_raw(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.backend.set(key, value)?;
        self.announce(Some(key));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.remove(key)?;
        self.announce(Some(key));
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.clear()?;
        self.announce(None);
        Ok(())
    }

    /// Deserialize the collection stored under `key`.
    ///
    /// Absent keys, unreadable media, and corrupt JSON all read as `None`;
    /// corruption is logged.
    #[must_use]
    pub fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_raw(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt stored collection; ignoring");
                None
            }
        }
    }

    /// # Errors
    ///
    /// Returns [`StorageError::Serialize`] if `value` cannot be encoded, or the
    /// backend's error if the write fails.
    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, &raw)
    }

    /// Bytes the value under `key` occupies, 0 when absent.
    #[must_use]
    pub fn value_len(&self, key: &str) -> usize {
        self.get_raw(key).map_or(0, |v| v.len())
    }

    /// Watch for changes to `key` made by other tabs.
    #[must_use]
    pub fn watch(&self, key: &str) -> StorageWatcher {
        StorageWatcher {
            rx: self.events.subscribe(),
            key: key.to_string(),
            tab: self.tab,
        }
    }

    fn announce(&self, key: Option<&str>) {
        // No receivers is the common case outside of watch tasks.
        let _ = self.events.send(StorageEvent {
            key: key.map(str::to_string),
            origin: self.tab,
        });
    }
}

/// Receives storage events for one key that originate in other tabs.
#[derive(Debug)]
pub struct StorageWatcher {
    rx: broadcast::Receiver<StorageEvent>,
    key: String,
    tab: TabId,
}

impl StorageWatcher {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Wait for the next foreign change to the watched key, or a clear.
    ///
    /// Returns `None` once every [`Storage`] handle has been dropped. If the
    /// watcher fell behind and events were lost, a synthetic event for the
    /// watched key is returned so the caller resyncs.
    pub async fn changed(&mut self) -> Option<StorageEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.origin == self.tab {
                        continue;
                    }
                    match &event.key {
                        None => return Some(event),
                        Some(key) if *key == self.key => return Some(event),
                        Some(_) => {}
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(key = %self.key, skipped, "storage watcher lagged");
                    return Some(StorageEvent {
                        key: Some(self.key.clone()),
                        origin: self.tab,
                    });
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
