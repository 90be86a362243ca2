use std::path::PathBuf;

use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Whether admin product writes may land in the local store when the remote
/// API cannot be reached.
///
/// Authentication failures never fall back, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminWritePolicy {
    #[default]
    RemoteOnly,
    AllowLocalFallback,
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub api_base_url: String,
    pub api_timeout_secs: u64,
    pub api_user_agent: String,
    pub api_max_retries: u32,
    pub api_retry_backoff_base_ms: u64,
    pub data_dir: PathBuf,
    /// Byte budget for the persisted store; `None` means unlimited.
    pub storage_quota_bytes: Option<u64>,
    /// Catalog resync interval; `None` disables polling.
    pub catalog_resync_secs: Option<u64>,
    pub local_products_keep: usize,
    pub admin_write_policy: AdminWritePolicy,
    pub free_shipping_threshold: Decimal,
    pub flat_shipping_fee: Decimal,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("api_user_agent", &self.api_user_agent)
            .field("api_max_retries", &self.api_max_retries)
            .field("api_retry_backoff_base_ms", &self.api_retry_backoff_base_ms)
            .field("data_dir", &self.data_dir)
            .field("storage_quota_bytes", &self.storage_quota_bytes)
            .field("catalog_resync_secs", &self.catalog_resync_secs)
            .field("local_products_keep", &self.local_products_keep)
            .field("admin_write_policy", &self.admin_write_policy)
            .field("free_shipping_threshold", &self.free_shipping_threshold)
            .field("flat_shipping_fee", &self.flat_shipping_fee)
            .finish()
    }
}

impl AppConfig {
    /// Shipping policy derived from the configured threshold and fee.
    #[must_use]
    pub fn shipping_policy(&self) -> crate::ShippingPolicy {
        crate::ShippingPolicy {
            free_threshold: self.free_shipping_threshold,
            flat_fee: self.flat_shipping_fee,
        }
    }
}
