//! Application configuration

use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// Application configuration loaded from `ESPRIT_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// SQLite connection URL
    pub database_url: String,
    /// Upper bound on pooled SQLite connections
    pub max_connections: u32,
    /// How long a unit of work waits for a player lock before reporting a conflict
    pub lock_timeout_ms: u64,
    /// Fixed RNG seed for reproducible runs
    #[serde(default)]
    pub rng_seed: Option<u64>,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(Environment::with_prefix("ESPRIT"))
    }

    fn load(environment: Environment) -> Result<Self> {
        Config::builder()
            .set_default("database_url", "sqlite://esprit.db?mode=rwc")?
            .set_default("max_connections", 5)?
            .set_default("lock_timeout_ms", 5000)?
            .add_source(environment.try_parsing(true))
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid ESPRIT_* configuration")
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("ESPRIT").source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::load(env(&[])).unwrap();
        assert_eq!(config.database_url, "sqlite://esprit.db?mode=rwc");
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::load(env(&[
            ("ESPRIT_DATABASE_URL", "sqlite::memory:"),
            ("ESPRIT_LOCK_TIMEOUT_MS", "250"),
            ("ESPRIT_RNG_SEED", "42"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.lock_timeout(), Duration::from_millis(250));
        assert_eq!(config.rng_seed, Some(42));
    }

    #[test]
    fn test_rejects_malformed_numbers() {
        assert!(AppConfig::load(env(&[("ESPRIT_MAX_CONNECTIONS", "many")])).is_err());
    }
}
