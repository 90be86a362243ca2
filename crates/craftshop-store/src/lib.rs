//! Persisted key-value medium shared by the catalog and cart stores.
//!
//! Values are JSON strings, one blob per logical collection. Every write made
//! through a [`Storage`] handle is announced to the other "tabs" opened on the
//! same backend; in-process listeners hang off a [`ChangeNotifier`] owned by
//! each store.

pub mod file;
pub mod kv;
pub mod notify;
pub mod storage;

use thiserror::Error;

pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use notify::{ChangeNotifier, Subscription};
pub use storage::{Storage, StorageEvent, StorageWatcher, TabId};

#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would push the store past its byte budget. Nothing was written.
    #[error("storage quota exceeded writing {key}: {needed} bytes needed, quota is {quota}")]
    QuotaExceeded { key: String, needed: u64, quota: u64 },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

impl StorageError {
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

/// Bytes an entry counts against a quota: key plus value, as a browser
/// store would account for them.
#[must_use]
pub fn entry_size(key: &str, value: &str) -> u64 {
    u64::try_from(key.len() + value.len()).unwrap_or(u64::MAX)
}
