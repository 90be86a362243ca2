use craftshop_core::{Collection, FavoriteItem};
use craftshop_store::{ChangeNotifier, Storage, StorageWatcher, Subscription};

use crate::CartError;

const KEY: &str = Collection::Favorites.storage_key();

/// Saved-for-later products, one entry per id.
#[derive(Debug, Clone)]
pub struct FavoritesStore {
    storage: Storage,
    notifier: ChangeNotifier,
}

impl FavoritesStore {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            notifier: ChangeNotifier::new(),
        }
    }

    /// Unreadable data reads as no favorites.
    #[must_use]
    pub fn list(&self) -> Vec<FavoriteItem> {
        let mut items: Vec<FavoriteItem> = self.storage.read_json(KEY).unwrap_or_default();
        let mut seen = std::collections::HashSet::new();
        items.retain(|item| seen.insert(item.id));
        items
    }

    #[must_use]
    pub fn contains(&self, id: i64) -> bool {
        self.list().iter().any(|item| item.id == id)
    }

    /// Add the item, or remove it if it is already a favorite. Returns whether
    /// it is a favorite afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the list cannot be persisted.
    pub fn toggle(&self, item: FavoriteItem) -> Result<bool, CartError> {
        let mut items = self.list();
        let before = items.len();
        items.retain(|existing| existing.id != item.id);
        let added = items.len() == before;
        if added {
            items.push(item);
        }
        self.commit(&items)?;
        Ok(added)
    }

    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// As [`FavoritesStore::toggle`].
    pub fn remove(&self, id: i64) -> Result<bool, CartError> {
        let mut items = self.list();
        let before = items.len();
        items.retain(|existing| existing.id != id);
        if items.len() == before {
            return Ok(false);
        }
        self.commit(&items)?;
        Ok(true)
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    #[must_use]
    pub fn watch_foreign(&self) -> StorageWatcher {
        self.storage.watch(KEY)
    }

    fn commit(&self, items: &[FavoriteItem]) -> Result<(), CartError> {
        self.storage
            .write_json(KEY, items)
            .map_err(|source| CartError::Storage {
                collection: KEY,
                source,
            })?;
        self.notifier.notify();
        Ok(())
    }
}
