//! Cart engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional; defaults match the collection names the mobile clients
//! have always used.
//!
//! - `CART_COLLECTION` - remote collection holding cart line documents
//!   (default: `cart`)
//! - `CART_ORDER_COLLECTION` - remote collection holding placed orders
//!   (default: `order`)
//! - `CART_CACHE_PREFIX` - local cache key namespace (default: `cart`);
//!   snapshot keys are `<prefix>:<ownerId>`

use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Remote collection holding one document per cart line.
    pub cart_collection: String,
    /// Remote collection holding placed orders.
    pub order_collection: String,
    /// Namespace prefix for local cache snapshot keys.
    pub cache_prefix: String,
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            cart_collection: "cart".to_string(),
            order_collection: "order".to_string(),
            cache_prefix: "cart".to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    /// Missing variables fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but empty, or if the
    /// cache prefix contains the `:` key separator.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let cart_collection = env_or("CART_COLLECTION", defaults.cart_collection)?;
        let order_collection = env_or("CART_ORDER_COLLECTION", defaults.order_collection)?;
        let cache_prefix = env_or("CART_CACHE_PREFIX", defaults.cache_prefix)?;

        if cache_prefix.contains(':') {
            return Err(ConfigError::InvalidEnvVar(
                "CART_CACHE_PREFIX".to_string(),
                "must not contain ':'".to_string(),
            ));
        }

        Ok(Self {
            cart_collection,
            order_collection,
            cache_prefix,
        })
    }
}

fn env_or(name: &str, default: String) -> Result<String, ConfigError> {
    non_empty(name, std::env::var(name).ok(), default)
}

// Split from env_or so the validation is testable without touching the
// process environment, which is racy across parallel tests.
fn non_empty(
    name: &str,
    value: Option<String>,
    default: String,
) -> Result<String, ConfigError> {
    match value {
        Some(value) if value.trim().is_empty() => Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            "must not be empty".to_string(),
        )),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_legacy_collection_names() {
        let config = CartConfig::default();
        assert_eq!(config.cart_collection, "cart");
        assert_eq!(config.order_collection, "order");
        assert_eq!(config.cache_prefix, "cart");
    }

    #[test]
    fn test_unset_variable_falls_back_to_default() {
        let value = non_empty("CART_COLLECTION", None, "cart".to_string());
        assert_eq!(value.expect("default applies"), "cart");
    }

    #[test]
    fn test_set_variable_overrides_default() {
        let value = non_empty(
            "CART_COLLECTION",
            Some("basket".to_string()),
            "cart".to_string(),
        );
        assert_eq!(value.expect("value applies"), "basket");
    }

    #[test]
    fn test_empty_variable_is_rejected() {
        let err = non_empty("CART_COLLECTION", Some("  ".to_string()), "cart".to_string())
            .expect_err("blank value must be rejected");
        assert!(matches!(
            err,
            ConfigError::InvalidEnvVar(name, _) if name == "CART_COLLECTION"
        ));
    }
}
