//! Remote-first product reads with local fallback, and the admin write path.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use craftshop_api::{ApiClient, ApiError, ImageUpload, NewReview};
use craftshop_core::{AdminWritePolicy, AppConfig, Collection, Product, ProductDraft, ProductPatch};
use craftshop_store::{ChangeNotifier, Storage, StorageWatcher, Subscription};
use serde_json::{Map, Value};

use crate::error::CatalogError;
use crate::local::LocalProducts;
use crate::normalize::{normalize_product, normalize_products, ALIAS_GROUPS};
use crate::session::Session;

/// Resolves the product list and product detail from the remote API, falling
/// back to the locally persisted collection. Reads never fail.
///
/// Clones share the last-seen cache and the change notifier.
#[derive(Debug, Clone)]
pub struct CatalogCache {
    api: ApiClient,
    local: LocalProducts,
    session: Session,
    notifier: ChangeNotifier,
    seen: Arc<Mutex<HashMap<i64, Product>>>,
    write_policy: AdminWritePolicy,
}

impl CatalogCache {
    #[must_use]
    pub fn new(api: ApiClient, storage: Storage) -> Self {
        Self {
            session: Session::new(api.clone(), storage.clone()),
            local: LocalProducts::new(storage),
            api,
            notifier: ChangeNotifier::new(),
            seen: Arc::default(),
            write_policy: AdminWritePolicy::default(),
        }
    }

    #[must_use]
    pub fn from_config(api: ApiClient, storage: Storage, config: &AppConfig) -> Self {
        Self::new(api, storage)
            .with_write_policy(config.admin_write_policy)
            .with_local_keep(config.local_products_keep)
    }

    #[must_use]
    pub fn with_write_policy(mut self, policy: AdminWritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    #[must_use]
    pub fn with_local_keep(mut self, keep: usize) -> Self {
        self.local = self.local.with_keep(keep);
        self
    }

    #[must_use]
    pub fn local(&self) -> &LocalProducts {
        &self.local
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Register a listener for product changes made through this cache.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notifier.subscribe(listener)
    }

    /// Changes to the local product collection made from other tabs.
    #[must_use]
    pub fn watch_foreign(&self) -> StorageWatcher {
        self.local
            .storage()
            .watch(Collection::AdminProducts.storage_key())
    }

    /// The authoritative product list for this call.
    ///
    /// A non-empty remote answer wins; if any of its records cannot be
    /// normalized the result is empty. A failed or empty remote answer reads
    /// the local collection instead.
    pub async fn list_products(&self) -> Vec<Product> {
        match self.api.list_products().await {
            Ok(records) if !records.is_empty() => match normalize_products(&records) {
                Ok(products) => {
                    self.remember(&products);
                    products
                }
                Err(e) => {
                    tracing::warn!(error = %e, count = records.len(), "remote product list failed normalization");
                    Vec::new()
                }
            },
            Ok(_) => {
                tracing::debug!("remote product list empty; reading local products");
                self.local_products()
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote product list unavailable; reading local products");
                self.local_products()
            }
        }
    }

    /// One product by id. Fields the remote record leaves out are filled
    /// from the last copy this cache saw, so a partial response never loses
    /// data already shown.
    pub async fn get_product(&self, id: i64) -> Option<Product> {
        match self.api.get_product(id).await {
            Ok(raw) => {
                let merged = self.merge_known(id, raw);
                match normalize_product(&merged) {
                    Ok(product) => {
                        self.remember(std::slice::from_ref(&product));
                        Some(product)
                    }
                    Err(e) => {
                        tracing::warn!(id, error = %e, "remote product failed normalization");
                        self.known(id)
                    }
                }
            }
            Err(ApiError::NotFound(_)) => {
                tracing::debug!(id, "product not on the API; checking local copies");
                self.known(id)
            }
            Err(e) => {
                tracing::warn!(id, error = %e, "remote product unavailable; checking local copies");
                self.known(id)
            }
        }
    }

    /// # Errors
    ///
    /// - [`CatalogError::Unauthorized`] when the API rejects the credentials.
    /// - [`CatalogError::Api`] on other API failures, unless the policy
    ///   allows a local write for transport failures.
    /// - [`CatalogError::QuotaExceeded`] if the local fallback runs out of room.
    pub async fn create_product(&self, draft: &ProductDraft) -> Result<Product, CatalogError> {
        let token = self.session.token_for_write().await;
        match self.api.create_product(draft, token.as_deref()).await {
            Ok(raw) => {
                self.notifier.notify();
                let product = normalize_product(&raw)?;
                self.remember(std::slice::from_ref(&product));
                tracing::info!(id = product.id, name = %product.name, "created product");
                Ok(product)
            }
            Err(e) => self.write_locally(e, "create", || self.local.save(draft)),
        }
    }

    /// # Errors
    ///
    /// As [`CatalogCache::create_product`], plus [`CatalogError::NotFound`].
    pub async fn update_product(
        &self,
        id: i64,
        patch: &ProductPatch,
    ) -> Result<Product, CatalogError> {
        let token = self.session.token_for_write().await;
        match self.api.update_product(id, patch, token.as_deref()).await {
            Ok(raw) => {
                self.notifier.notify();
                let product = normalize_product(&self.merge_known(id, raw))?;
                self.remember(std::slice::from_ref(&product));
                tracing::info!(id, "updated product");
                Ok(product)
            }
            Err(ApiError::NotFound(_)) => Err(CatalogError::NotFound(id)),
            Err(e) => self.write_locally(e, "update", || {
                if let Some(product) = self.local.update(id, patch)? {
                    return Ok(product);
                }
                let Some(seen) = self.seen_copy(id) else {
                    return Err(CatalogError::NotFound(id));
                };
                let mut merged = serde_json::to_value(&seen).unwrap_or(Value::Null);
                if let (Value::Object(base), Ok(Value::Object(fields))) =
                    (&mut merged, serde_json::to_value(patch))
                {
                    base.extend(fields);
                    base.insert("id".to_string(), Value::from(id));
                }
                let product = normalize_product(&merged)?;
                self.local.put(product.clone())?;
                Ok(product)
            }),
        }
    }

    /// A product missing from the API but present locally is deleted locally.
    ///
    /// # Errors
    ///
    /// As [`CatalogCache::update_product`].
    pub async fn delete_product(&self, id: i64) -> Result<(), CatalogError> {
        let token = self.session.token_for_write().await;
        match self.api.delete_product(id, token.as_deref()).await {
            Ok(()) => {
                self.forget(id);
                self.notifier.notify();
                tracing::info!(id, "deleted product");
                Ok(())
            }
            Err(ApiError::NotFound(_)) => {
                if self.local.delete(id)? {
                    self.forget(id);
                    self.notifier.notify();
                    Ok(())
                } else {
                    Err(CatalogError::NotFound(id))
                }
            }
            Err(e) => self.write_locally(e, "delete", || {
                if self.local.delete(id)? {
                    self.forget(id);
                    Ok(())
                } else {
                    Err(CatalogError::NotFound(id))
                }
            }),
        }
    }

    /// Submit a review and return the product as it stands afterwards.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Invalid`] for a rating outside 1–5, otherwise as
    /// [`CatalogError::NotFound`] and the other write errors.
    pub async fn add_review(&self, id: i64, review: &NewReview) -> Result<Product, CatalogError> {
        if !(1..=5).contains(&review.rating) {
            return Err(CatalogError::Invalid(format!(
                "rating must be between 1 and 5, got {}",
                review.rating
            )));
        }
        let token = self.session.token_for_write().await;
        match self.api.add_review(id, review, token.as_deref()).await {
            Ok(_) => {
                self.notifier.notify();
                self.get_product(id).await.ok_or(CatalogError::NotFound(id))
            }
            Err(ApiError::NotFound(_)) => Err(CatalogError::NotFound(id)),
            Err(e) => self.write_locally(e, "review", || {
                self.local
                    .add_review(id, review, Local::now().date_naive())?
                    .ok_or(CatalogError::NotFound(id))
            }),
        }
    }

    /// Upload an image and return its URL. When the API is unreachable and
    /// local writes are allowed, a data URI is returned as-is so it can be
    /// stored inline.
    ///
    /// # Errors
    ///
    /// As [`CatalogCache::create_product`].
    pub async fn upload_image(&self, upload: ImageUpload) -> Result<String, CatalogError> {
        let inline = match &upload {
            ImageUpload::DataUri(uri) => Some(uri.clone()),
            ImageUpload::File { .. } => None,
        };
        let token = self.session.token_for_write().await;
        match self.api.upload_image(upload, token.as_deref()).await {
            Ok(uploaded) => Ok(uploaded.url),
            Err(e) => match inline {
                Some(uri) => self.write_locally(e, "upload", || Ok(uri)),
                None => Err(fail_write(e)),
            },
        }
    }

    /// Decide what a failed remote write turns into. Auth failures never
    /// reach the local store.
    fn write_locally<T>(
        &self,
        err: ApiError,
        op: &'static str,
        write: impl FnOnce() -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        if err.is_transport() && self.write_policy == AdminWritePolicy::AllowLocalFallback {
            tracing::warn!(op, error = %err, "product API unavailable; writing to local store");
            let out = write()?;
            self.notifier.notify();
            return Ok(out);
        }
        Err(fail_write(err))
    }

    fn local_products(&self) -> Vec<Product> {
        let products = self.local.all();
        self.remember(&products);
        products
    }

    fn remember(&self, products: &[Product]) {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        for product in products {
            seen.insert(product.id, product.clone());
        }
    }

    fn forget(&self, id: i64) {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn seen_copy(&self, id: i64) -> Option<Product> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Last-seen copy from this cache, then the local store.
    fn known(&self, id: i64) -> Option<Product> {
        self.seen_copy(id).or_else(|| self.local.find(id))
    }

    fn merge_known(&self, id: i64, raw: Value) -> Value {
        let Some(known) = self.known(id) else {
            return raw;
        };
        match (raw, serde_json::to_value(&known)) {
            (Value::Object(mut remote), Ok(Value::Object(base))) => {
                fill_missing(&mut remote, &base);
                tracing::debug!(id, "merged partial product with last-seen copy");
                Value::Object(remote)
            }
            (raw, _) => raw,
        }
    }
}

fn fail_write(err: ApiError) -> CatalogError {
    if err.is_auth() {
        CatalogError::unauthorized(&err)
    } else {
        CatalogError::Api(err)
    }
}

/// Copy into `remote` every field of `base` whose canonical field the remote
/// record leaves absent or null, treating alias spellings as one field.
///
/// The rating follows the reviews: when the remote record brings its own
/// reviews, a missing rating is recomputed from them rather than copied.
fn fill_missing(remote: &mut Map<String, Value>, base: &Map<String, Value>) {
    let present = |remote: &Map<String, Value>, key: &str| {
        remote.get(key).is_some_and(|v| !v.is_null())
    };
    let fresh_reviews = present(remote, "reviews");
    for (key, value) in base {
        if value.is_null() || (fresh_reviews && key == "rating") {
            continue;
        }
        let group = ALIAS_GROUPS
            .iter()
            .find(|g| g.contains(&key.as_str()))
            .copied();
        let provided = match group {
            Some(aliases) => aliases.iter().any(|alias| present(remote, alias)),
            None => present(remote, key),
        };
        if !provided {
            remote.insert(key.clone(), value.clone());
        }
    }
}
