//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use common::{ClientId, UserId};
use domain::{CheckoutSettings, DEFAULT_SHOP_NAME, TotalPolicy};

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `DATABASE_URL`: PostgreSQL connection string; unset runs on the
///   in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `CHECKOUT_MAX_ATTEMPTS`: attempts per checkout on conflicts (default: `3`)
/// - `CHECKOUT_LOCK_TIMEOUT_MS`: row lock wait limit, `0` waits forever
///   (default: `5000`)
/// - `CHECKOUT_TOTAL_POLICY`: `trust` or `verify` (default: `trust`)
/// - `POS_CLIENT_ID` / `POS_USER_ID`: recorded on every sale (default: `1`)
/// - `SHOP_NAME`: heading printed on invoices
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub checkout_max_attempts: u32,
    pub checkout_lock_timeout_ms: u64,
    pub total_policy: TotalPolicy,
    pub client_id: ClientId,
    pub user_id: UserId,
    pub shop_name: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Loads configuration from any key lookup. Unparseable values fall back
    /// to their defaults with a warning.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_or(&var, "PORT", defaults.port),
            log_level: var("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: var("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            database_max_connections: parse_or(
                &var,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            checkout_max_attempts: parse_or(
                &var,
                "CHECKOUT_MAX_ATTEMPTS",
                defaults.checkout_max_attempts,
            ),
            checkout_lock_timeout_ms: parse_or(
                &var,
                "CHECKOUT_LOCK_TIMEOUT_MS",
                defaults.checkout_lock_timeout_ms,
            ),
            total_policy: parse_or(&var, "CHECKOUT_TOTAL_POLICY", defaults.total_policy),
            client_id: parse_or(&var, "POS_CLIENT_ID", defaults.client_id),
            user_id: parse_or(&var, "POS_USER_ID", defaults.user_id),
            shop_name: var("SHOP_NAME").unwrap_or(defaults.shop_name),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the order transaction.
    pub fn checkout_settings(&self) -> CheckoutSettings {
        CheckoutSettings {
            max_attempts: self.checkout_max_attempts.max(1),
            lock_timeout_ms: Some(self.checkout_lock_timeout_ms).filter(|ms| *ms > 0),
            total_policy: self.total_policy,
            client_id: self.client_id,
            user_id: self.user_id,
            retry_backoff: Duration::from_millis(20),
        }
    }
}

fn parse_or<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match var(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            database_max_connections: 5,
            checkout_max_attempts: 3,
            checkout_lock_timeout_ms: 5_000,
            total_policy: TotalPolicy::Trust,
            client_id: ClientId::new(1),
            user_id: UserId::new(1),
            shop_name: DEFAULT_SHOP_NAME.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert!(config.database_url.is_none());
        assert_eq!(config.shop_name, "Hardware Store");
    }

    #[test]
    fn test_addr_formatting() {
        let config = Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..Config::default()
        };
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_reads_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/pos"),
            ("CHECKOUT_TOTAL_POLICY", "Verify"),
            ("CHECKOUT_MAX_ATTEMPTS", "5"),
            ("POS_CLIENT_ID", "7"),
            ("SHOP_NAME", "Corner Shop"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/pos")
        );
        assert_eq!(config.total_policy, TotalPolicy::Verify);
        assert_eq!(config.checkout_max_attempts, 5);
        assert_eq!(config.client_id, ClientId::new(7));
        assert_eq!(config.shop_name, "Corner Shop");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = from_map(&[
            ("PORT", "eighty"),
            ("CHECKOUT_TOTAL_POLICY", "sometimes"),
            ("DATABASE_URL", "  "),
        ]);

        assert_eq!(config.port, 3000);
        assert_eq!(config.total_policy, TotalPolicy::Trust);
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_zero_lock_timeout_waits_forever() {
        let config = from_map(&[("CHECKOUT_LOCK_TIMEOUT_MS", "0")]);
        assert_eq!(config.checkout_settings().lock_timeout_ms, None);

        let settings = Config::default().checkout_settings();
        assert_eq!(settings.lock_timeout_ms, Some(5_000));
        assert_eq!(settings.max_attempts, 3);
    }
}
