use std::collections::HashMap;

use craftshop_core::{CartItem, CartTotals, Collection, ShippingPolicy};
use craftshop_store::{ChangeNotifier, Storage, StorageWatcher, Subscription};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::CartError;

const KEY: &str = Collection::CartItems.storage_key();

/// Persisted row as read back, before repair. Quantity is signed so a bad
/// row can be recognised and dropped instead of failing the whole cart.
#[derive(Deserialize)]
struct StoredRow {
    id: i64,
    name: String,
    price: Decimal,
    #[serde(default)]
    image: String,
    #[serde(default)]
    alt: String,
    quantity: i64,
}

/// The shopping cart. Every mutation reads the stored collection, changes
/// it, writes it back whole and then notifies listeners synchronously.
#[derive(Debug, Clone)]
pub struct CartStore {
    storage: Storage,
    policy: ShippingPolicy,
    notifier: ChangeNotifier,
}

impl CartStore {
    #[must_use]
    pub fn new(storage: Storage, policy: ShippingPolicy) -> Self {
        Self {
            storage,
            policy,
            notifier: ChangeNotifier::new(),
        }
    }

    #[must_use]
    pub fn policy(&self) -> ShippingPolicy {
        self.policy
    }

    /// Current cart lines. Unreadable data reads as an empty cart; rows with
    /// a quantity below one are dropped and repeated ids are merged.
    #[must_use]
    pub fn items(&self) -> Vec<CartItem> {
        let Some(rows) = self.storage.read_json::<Vec<Value>>(KEY) else {
            return Vec::new();
        };
        repair(rows)
    }

    /// Add `item.quantity` of a product, merging with an existing line for
    /// the same id. The existing snapshot is kept. A zero quantity changes
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if the cart cannot be persisted.
    pub fn add_item(&self, item: CartItem) -> Result<Vec<CartItem>, CartError> {
        let mut items = self.items();
        if item.quantity == 0 {
            return Ok(items);
        }
        match items.iter_mut().find(|line| line.id == item.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => items.push(item),
        }
        self.commit(items)
    }

    /// # Errors
    ///
    /// As [`CartStore::add_item`].
    pub fn add_one(&self, item: CartItem) -> Result<Vec<CartItem>, CartError> {
        self.add_item(CartItem { quantity: 1, ..item })
    }

    /// Set a line's quantity. Anything below one removes the line. An id
    /// that is not in the cart adds nothing, but the cart is still written
    /// back and listeners are still notified.
    ///
    /// # Errors
    ///
    /// As [`CartStore::add_item`].
    pub fn update_quantity(&self, id: i64, quantity: i64) -> Result<Vec<CartItem>, CartError> {
        if quantity < 1 {
            return self.remove_item(id);
        }
        let mut items = self.items();
        if let Some(line) = items.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self.commit(items)
    }

    /// Removing an id that is not in the cart returns the cart unchanged.
    ///
    /// # Errors
    ///
    /// As [`CartStore::add_item`].
    pub fn remove_item(&self, id: i64) -> Result<Vec<CartItem>, CartError> {
        let mut items = self.items();
        let before = items.len();
        items.retain(|line| line.id != id);
        if items.len() == before {
            return Ok(items);
        }
        self.commit(items)
    }

    /// # Errors
    ///
    /// As [`CartStore::add_item`].
    pub fn clear(&self) -> Result<(), CartError> {
        self.storage.remove(KEY).map_err(storage_error)?;
        tracing::debug!("cart cleared");
        self.notifier.notify();
        Ok(())
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items().iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.items().len()
    }

    #[must_use]
    pub fn totals(&self) -> CartTotals {
        CartTotals::compute(&self.items(), &self.policy)
    }

    #[must_use]
    pub fn amount_until_free_shipping(&self) -> Decimal {
        self.policy.amount_until_free(self.totals().subtotal)
    }

    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Cart changes made from other tabs.
    #[must_use]
    pub fn watch_foreign(&self) -> StorageWatcher {
        self.storage.watch(KEY)
    }

    fn commit(&self, items: Vec<CartItem>) -> Result<Vec<CartItem>, CartError> {
        self.storage.write_json(KEY, &items).map_err(storage_error)?;
        tracing::debug!(lines = items.len(), "cart saved");
        self.notifier.notify();
        Ok(items)
    }
}

fn storage_error(source: craftshop_store::StorageError) -> CartError {
    tracing::warn!(error = %source, "failed to persist cart");
    CartError::Storage {
        collection: KEY,
        source,
    }
}

fn repair(rows: Vec<Value>) -> Vec<CartItem> {
    let mut items: Vec<CartItem> = Vec::with_capacity(rows.len());
    let mut index: HashMap<i64, usize> = HashMap::new();
    for raw in rows {
        let row: StoredRow = match serde_json::from_value(raw) {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, "dropping unreadable cart row");
                continue;
            }
        };
        if row.quantity < 1 {
            tracing::debug!(id = row.id, quantity = row.quantity, "dropping empty cart row");
            continue;
        }
        let quantity = u32::try_from(row.quantity).unwrap_or(u32::MAX);
        if let Some(&at) = index.get(&row.id) {
            let line = &mut items[at];
            line.quantity = line.quantity.saturating_add(quantity);
            continue;
        }
        index.insert(row.id, items.len());
        items.push(CartItem {
            id: row.id,
            name: row.name,
            price: row.price,
            image: row.image,
            alt: row.alt,
            quantity,
        });
    }
    items
}
