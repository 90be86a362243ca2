use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::app_config::{AdminWritePolicy, AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable
/// development config pointing at a local API.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.trim()
            .parse::<u32>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_decimal = |var: &str, default: &str| -> Result<Decimal, ConfigError> {
        let raw = or_default(var, default);
        let value = Decimal::from_str(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if value.is_sign_negative() {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("CRAFTSHOP_ENV", "development"))?;
    let log_level = or_default("CRAFTSHOP_LOG_LEVEL", "info");

    let api_base_url = or_default("CRAFTSHOP_API_BASE_URL", "http://localhost:8000/api");
    let api_timeout_secs = parse("CRAFTSHOP_API_TIMEOUT_SECS", "10")?;
    let api_user_agent = or_default(
        "CRAFTSHOP_API_USER_AGENT",
        "craftshop/0.1 (storefront-client)",
    );
    let api_max_retries = parse_u32("CRAFTSHOP_API_MAX_RETRIES", "2")?;
    let api_retry_backoff_base_ms = parse("CRAFTSHOP_API_RETRY_BACKOFF_BASE_MS", "500")?;

    let data_dir = PathBuf::from(or_default("CRAFTSHOP_DATA_DIR", "./.craftshop"));
    let storage_quota_bytes =
        Some(parse("CRAFTSHOP_STORAGE_QUOTA_BYTES", "5242880")?).filter(|&q| q > 0);
    let catalog_resync_secs =
        Some(parse("CRAFTSHOP_CATALOG_RESYNC_SECS", "60")?).filter(|&s| s > 0);

    let local_products_keep = usize::try_from(parse("CRAFTSHOP_LOCAL_PRODUCTS_KEEP", "10")?)
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "CRAFTSHOP_LOCAL_PRODUCTS_KEEP".to_string(),
            reason: e.to_string(),
        })?;
    let admin_write_policy =
        parse_write_policy(&or_default("CRAFTSHOP_ADMIN_LOCAL_FALLBACK", "false"))?;

    let free_shipping_threshold = parse_decimal("CRAFTSHOP_FREE_SHIPPING_THRESHOLD", "100")?;
    let flat_shipping_fee = parse_decimal("CRAFTSHOP_FLAT_SHIPPING_FEE", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        api_timeout_secs,
        api_user_agent,
        api_max_retries,
        api_retry_backoff_base_ms,
        data_dir,
        storage_quota_bytes,
        catalog_resync_secs,
        local_products_keep,
        admin_write_policy,
        free_shipping_threshold,
        flat_shipping_fee,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s.trim() {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CRAFTSHOP_ENV".to_string(),
            reason: format!("expected development, test, or production; got \"{other}\""),
        }),
    }
}

fn parse_write_policy(s: &str) -> Result<AdminWritePolicy, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(AdminWritePolicy::AllowLocalFallback),
        "false" | "0" | "no" | "" => Ok(AdminWritePolicy::RemoteOnly),
        other => Err(ConfigError::InvalidEnvVar {
            var: "CRAFTSHOP_ADMIN_LOCAL_FALLBACK".to_string(),
            reason: format!("expected a boolean, got \"{other}\""),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
