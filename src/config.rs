//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::time::Duration;

use serde::Deserialize;

use crate::services::ledger::LedgerSettings;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
/// - `DATABASE_MAX_CONNECTIONS` (optional): pool size, defaults to 5
/// - `LOCK_TIMEOUT_MS` (optional): how long an operation waits for an account lock, defaults to 2000
/// - `DEFAULT_CURRENCY` (optional): three-letter currency of newly opened wallets, defaults to "INR"
/// - `CORS_ORIGIN` (optional): browser origin allowed to call the API
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    #[serde(default = "default_currency", deserialize_with = "currency_code")]
    pub default_currency: String,

    #[serde(default)]
    pub cors_origin: Option<String>,
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

fn default_max_connections() -> u32 {
    5
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

fn default_currency() -> String {
    "INR".to_string()
}

/// Accept exactly three ASCII letters, stored uppercase to fit the `currency` columns.
fn currency_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let code = raw.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(serde::de::Error::custom(format!(
            "DEFAULT_CURRENCY must be a 3-letter code, got {raw:?}"
        )));
    }
    Ok(code)
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: lock_timeout_ms -> LOCK_TIMEOUT_MS
        envy::from_env::<Config>()
    }

    /// Settings handed to the ledger service at startup.
    pub fn ledger_settings(&self) -> LedgerSettings {
        LedgerSettings {
            lock_timeout: Duration::from_millis(self.lock_timeout_ms),
            default_currency: self.default_currency.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let vars = vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/ledger".to_string(),
        )];
        let config: Config = envy::from_iter(vars).unwrap();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.lock_timeout_ms, 2000);
        assert_eq!(config.default_currency, "INR");
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn ledger_settings_normalise_currency() {
        let vars = vec![
            ("DATABASE_URL".to_string(), "postgres://x".to_string()),
            ("DEFAULT_CURRENCY".to_string(), "eur".to_string()),
            ("LOCK_TIMEOUT_MS".to_string(), "250".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        let settings = config.ledger_settings();

        assert_eq!(settings.default_currency, "EUR");
        assert_eq!(settings.lock_timeout, Duration::from_millis(250));
    }

    #[test]
    fn currency_must_be_three_letters() {
        for bad in ["EURO", "US", "U$D"] {
            let vars = vec![
                ("DATABASE_URL".to_string(), "postgres://x".to_string()),
                ("DEFAULT_CURRENCY".to_string(), bad.to_string()),
            ];
            assert!(envy::from_iter::<_, Config>(vars).is_err(), "accepted {bad:?}");
        }
    }
}
