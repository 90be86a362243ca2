//! Catalog cache: remote-first product reads with a local persisted
//! fallback, the admin write path, and the listing helpers built on top.

pub mod cache;
pub mod error;
pub mod local;
pub mod normalize;
pub mod query;
pub mod session;
pub mod watch;

pub use cache::CatalogCache;
pub use error::CatalogError;
pub use local::{LocalProducts, LocalUsage};
pub use normalize::{normalize_product, normalize_product_on, normalize_products};
pub use query::{ListingQuery, Page, SortOrder};
pub use session::{Session, SessionUser};
pub use watch::{spawn_product_watch, spawn_watch, CatalogWatch, ProductWatch, ResyncInterval};
