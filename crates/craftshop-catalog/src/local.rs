//! The locally persisted product collection (`adminProducts`).
//!
//! Admin flows mirror their writes here when the API is unreachable and the
//! write policy allows it. Every write goes through [`Storage`], so other
//! tabs see an `adminProducts` change signal.

use chrono::{Local, NaiveDate};
use craftshop_api::NewReview;
use craftshop_core::{Collection, Product, ProductDraft, ProductPatch, Review};
use craftshop_store::{Storage, StorageError};
use serde_json::Value;

use crate::error::CatalogError;
use crate::normalize::{mean_rating, normalize_product_on};

const DEFAULT_KEEP: usize = 10;
const FALLBACK_KEEP: usize = 5;
const NEW_PRODUCT_RATING: f64 = 5.0;

/// Size of the local product collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalUsage {
    pub bytes: usize,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct LocalProducts {
    storage: Storage,
    keep: usize,
}

impl LocalProducts {
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage,
            keep: DEFAULT_KEEP,
        }
    }

    /// How many of the newest products survive a quota cleanup.
    #[must_use]
    pub fn with_keep(mut self, keep: usize) -> Self {
        self.keep = keep.max(1);
        self
    }

    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn key() -> &'static str {
        Collection::AdminProducts.storage_key()
    }

    /// Every stored product. Missing or corrupt data reads as empty; records
    /// that no longer normalize are skipped.
    #[must_use]
    pub fn all(&self) -> Vec<Product> {
        let Some(raw) = self.storage.read_json::<Vec<Value>>(Self::key()) else {
            return Vec::new();
        };
        let today = Local::now().date_naive();
        raw.iter()
            .filter_map(|record| match normalize_product_on(record, today) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable local product");
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn find(&self, id: i64) -> Option<Product> {
        self.all().into_iter().find(|p| p.id == id)
    }

    /// Store a new product with id `max + 1` (1 when empty) and, unless the
    /// draft carries one, a rating of 5.
    ///
    /// When the store is over quota, only the newest products are kept and
    /// the write is retried, first with the configured count and then with
    /// five.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::QuotaExceeded`] when even the reduced
    /// collection does not fit, or [`CatalogError::Storage`] on other
    /// storage failures.
    pub fn save(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let mut products = self.all();
        let id = next_id(products.iter().map(|p| p.id), "product")?;

        let mut record = serde_json::to_value(draft).map_err(StorageError::from)?;
        if let Value::Object(map) = &mut record {
            map.insert("id".to_string(), Value::from(id));
            if draft.rating.is_none() {
                map.insert("rating".to_string(), Value::from(NEW_PRODUCT_RATING));
            }
        }
        let product = normalize_product_on(&record, Local::now().date_naive())?;
        products.push(product.clone());

        self.write_with_cleanup(products, id)?;
        tracing::info!(id, name = %product.name, "saved product locally");
        Ok(product)
    }

    /// Insert `product`, replacing any stored product with the same id.
    ///
    /// # Errors
    ///
    /// As [`LocalProducts::save`].
    pub fn put(&self, product: Product) -> Result<(), CatalogError> {
        let id = product.id;
        let mut products = self.all();
        match products.iter_mut().find(|p| p.id == id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
        self.write_with_cleanup(products, id)
    }

    /// Merge `patch` into the stored product and re-normalize it; the id never
    /// changes. Returns `None` when no product has that id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::QuotaExceeded`] or [`CatalogError::Storage`]
    /// if the write fails.
    pub fn update(&self, id: i64, patch: &ProductPatch) -> Result<Option<Product>, CatalogError> {
        let mut products = self.all();
        let Some(slot) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        let mut merged = serde_json::to_value(&*slot).map_err(StorageError::from)?;
        let overlay = serde_json::to_value(patch).map_err(StorageError::from)?;
        if let (Value::Object(base), Value::Object(fields)) = (&mut merged, overlay) {
            base.extend(fields);
            base.insert("id".to_string(), Value::from(id));
        }
        let updated = normalize_product_on(&merged, Local::now().date_naive())?;
        *slot = updated.clone();

        self.storage.write_json(Self::key(), &products)?;
        tracing::info!(id, "updated local product");
        Ok(Some(updated))
    }

    /// Append a review and recompute the rating as the rounded mean.
    /// Returns `None` when no product has that id.
    ///
    /// # Errors
    ///
    /// As [`LocalProducts::update`].
    pub fn add_review(
        &self,
        id: i64,
        review: &NewReview,
        today: NaiveDate,
    ) -> Result<Option<Product>, CatalogError> {
        let mut products = self.all();
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        let review_id = next_id(product.reviews.iter().map(|r| r.id), "review")?;
        product.reviews.push(Review {
            id: review_id,
            user_name: if review.user_name.trim().is_empty() {
                "Anonymous".to_string()
            } else {
                review.user_name.clone()
            },
            rating: review.rating.clamp(1, 5),
            date: today.format("%Y-%m-%d").to_string(),
            comment: review.comment.clone(),
        });
        product.rating = mean_rating(&product.reviews).unwrap_or(product.rating);
        let updated = product.clone();

        self.storage.write_json(Self::key(), &products)?;
        Ok(Some(updated))
    }

    /// Returns whether a product was removed.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the write fails.
    pub fn delete(&self, id: i64) -> Result<bool, CatalogError> {
        let mut products = self.all();
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        self.storage.write_json(Self::key(), &products)?;
        tracing::info!(id, "deleted local product");
        Ok(true)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Storage`] if the key cannot be removed.
    pub fn clear(&self) -> Result<(), CatalogError> {
        self.storage.remove(Self::key())?;
        Ok(())
    }

    #[must_use]
    pub fn usage(&self) -> LocalUsage {
        LocalUsage {
            bytes: self.storage.value_len(Self::key()),
            count: self.all().len(),
        }
    }

    /// Write the collection; on quota errors retry with only the newest
    /// products (always including `must_keep`).
    fn write_with_cleanup(&self, products: Vec<Product>, must_keep: i64) -> Result<(), CatalogError> {
        let total = products.len();
        let err = match self.storage.write_json(Self::key(), &products) {
            Ok(()) => return Ok(()),
            Err(e) if e.is_quota_exceeded() => e,
            Err(e) => return Err(e.into()),
        };
        tracing::warn!(error = %err, total, "local product store over quota; dropping oldest products");

        for keep in [self.keep, FALLBACK_KEEP.min(self.keep)] {
            let trimmed = newest(&products, keep, must_keep);
            match self.storage.write_json(Self::key(), &trimmed) {
                Ok(()) => {
                    tracing::warn!(kept = trimmed.len(), dropped = total - trimmed.len(), "trimmed local product store");
                    return Ok(());
                }
                Err(e) if e.is_quota_exceeded() => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(CatalogError::QuotaExceeded {
            message: format!(
                "Local storage is full: the product does not fit even after keeping only the \
                 {FALLBACK_KEEP} newest products. Use a smaller image (embedded images count \
                 against storage) or delete products."
            ),
        })
    }
}

/// One past the largest id, or 1 for an empty collection.
fn next_id(ids: impl Iterator<Item = i64>, what: &str) -> Result<i64, CatalogError> {
    match ids.max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            CatalogError::Invalid(format!("no {what} id left after {max}"))
        }),
    }
}

/// The `keep` highest-id products other than `must_keep`, plus `must_keep`,
/// in their original order.
fn newest(products: &[Product], keep: usize, must_keep: i64) -> Vec<Product> {
    let mut ids: Vec<i64> = products
        .iter()
        .map(|p| p.id)
        .filter(|id| *id != must_keep)
        .collect();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids.truncate(keep);
    products
        .iter()
        .filter(|p| p.id == must_keep || ids.contains(&p.id))
        .cloned()
        .collect()
}
