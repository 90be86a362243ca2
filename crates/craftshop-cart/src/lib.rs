//! Shopping cart and favorites, persisted whole on every mutation.

pub mod cart;
pub mod favorites;

use craftshop_store::StorageError;
use thiserror::Error;

pub use cart::CartStore;
pub use favorites::FavoritesStore;

#[derive(Debug, Error)]
pub enum CartError {
    /// The collection could not be persisted. Listeners were not notified
    /// and the stored collection is unchanged.
    #[error("failed to save {collection}: {source}")]
    Storage {
        collection: &'static str,
        #[source]
        source: StorageError,
    },
}

impl CartError {
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        match self {
            CartError::Storage { source, .. } => source.is_quota_exceeded(),
        }
    }
}
