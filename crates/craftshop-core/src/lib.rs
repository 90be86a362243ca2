pub mod app_config;
pub mod cart;
pub mod collections;
pub mod config;
pub mod products;

use thiserror::Error;

pub use app_config::{AdminWritePolicy, AppConfig, Environment};
pub use cart::{CartItem, CartTotals, FavoriteItem, ShippingPolicy};
pub use collections::Collection;
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{Category, Product, ProductDraft, ProductPatch, Review, SubDescription};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown product category: {0}")]
    UnknownCategory(String),
}
