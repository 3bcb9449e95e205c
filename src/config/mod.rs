//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `FASTING_TRACKER` prefix
//! and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use fasting_tracker::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod actor_runtime;
mod cache;
mod database;
mod error;
mod redis;
mod telemetry;

pub use actor_runtime::ActorRuntimeConfig;
pub use cache::{CacheBackend, CacheConfig};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use self::redis::RedisConfig;
pub use telemetry::TelemetryConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL read model
    pub database: DatabaseConfig,

    /// Actor-grain runtime (snapshots and active-cycle index)
    pub actor_runtime: ActorRuntimeConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Only needed for the `redis` cache backend
    #[serde(default)]
    pub redis: Option<RedisConfig>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads `.env` when present, then variables such as
    /// `FASTING_TRACKER__DATABASE__URL` -> `database.url`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("FASTING_TRACKER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.actor_runtime.validate()?;
        self.cache.validate()?;
        match (&self.cache.backend, &self.redis) {
            (CacheBackend::Redis, None) => {
                return Err(ValidationError::MissingRequired("FASTING_TRACKER__REDIS__URL"))
            }
            (_, Some(redis)) => redis.validate()?,
            (CacheBackend::Memory, None) => {}
        }
        self.telemetry.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Env vars are process-global
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "FASTING_TRACKER__DATABASE__URL",
        "FASTING_TRACKER__ACTOR_RUNTIME__BASE_URL",
        "FASTING_TRACKER__ACTOR_RUNTIME__API_TOKEN",
        "FASTING_TRACKER__CACHE__BACKEND",
        "FASTING_TRACKER__CACHE__TTL_SECS",
        "FASTING_TRACKER__REDIS__URL",
        "FASTING_TRACKER__TELEMETRY__JSON",
    ];

    fn set_minimal_env() {
        env::set_var("FASTING_TRACKER__DATABASE__URL", "postgresql://test@localhost/fasting");
        env::set_var("FASTING_TRACKER__ACTOR_RUNTIME__BASE_URL", "http://localhost:4000");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_minimal_environment_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/fasting");
        assert_eq!(config.actor_runtime.base_url, "http://localhost:4000");
        assert_eq!(config.cache.backend, CacheBackend::Memory);
        assert!(config.redis.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_values_override_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("FASTING_TRACKER__CACHE__BACKEND", "redis");
        env::set_var("FASTING_TRACKER__CACHE__TTL_SECS", "60");
        env::set_var("FASTING_TRACKER__REDIS__URL", "redis://localhost:6379");
        env::set_var("FASTING_TRACKER__TELEMETRY__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.cache.backend, CacheBackend::Redis);
        assert_eq!(config.cache.ttl_secs, 60);
        assert!(config.telemetry.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn redis_backend_without_redis_section_is_invalid() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("FASTING_TRACKER__CACHE__BACKEND", "redis");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("FASTING_TRACKER__REDIS__URL"))
        );
    }

    #[test]
    fn missing_actor_runtime_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("FASTING_TRACKER__DATABASE__URL", "postgresql://test@localhost/fasting");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn api_token_is_loaded_as_secret() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("FASTING_TRACKER__ACTOR_RUNTIME__API_TOKEN", "grain-token");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.actor_runtime.api_token.is_some());
        assert!(!format!("{:?}", config).contains("grain-token"));
    }
}
