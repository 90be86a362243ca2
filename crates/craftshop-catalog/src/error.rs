use craftshop_api::ApiError;
use craftshop_store::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The API refused a mutating call for lack of valid credentials. Never
    /// retried against the local store.
    #[error("{0}")]
    Unauthorized(String),

    /// The local store is full even after dropping old products.
    #[error("{message}")]
    QuotaExceeded { message: String },

    #[error(transparent)]
    Storage(StorageError),

    #[error("normalization error for product {product_id}: {reason}")]
    Normalization { product_id: String, reason: String },

    #[error("product {0} not found")]
    NotFound(i64),

    #[error("invalid input: {0}")]
    Invalid(String),
}

impl From<StorageError> for CatalogError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::QuotaExceeded { key, needed, quota } => CatalogError::QuotaExceeded {
                message: format!(
                    "Local storage is full ({needed} of {quota} bytes needed for {key}). \
                     Delete some products or use smaller images."
                ),
            },
            other => CatalogError::Storage(other),
        }
    }
}

impl CatalogError {
    pub(crate) fn unauthorized(err: &ApiError) -> Self {
        let detail = match err {
            ApiError::Unauthorized { message, .. } => message.as_str(),
            _ => "credentials were rejected",
        };
        CatalogError::Unauthorized(format!(
            "Authentication required: {detail}. Please log in again."
        ))
    }
}
