//! Actor runtime configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Connection settings for the actor-grain runtime
#[derive(Debug, Clone, Deserialize)]
pub struct ActorRuntimeConfig {
    /// Base URL, e.g. `http://grains.internal:4000`
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Optional bearer token sent on every request
    #[serde(default)]
    pub api_token: Option<Secret<String>>,
}

impl ActorRuntimeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.base_url.is_empty() {
            return Err(ValidationError::MissingRequired(
                "FASTING_TRACKER__ACTOR_RUNTIME__BASE_URL",
            ));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ValidationError::InvalidActorRuntimeUrl);
        }
        if self.timeout_secs == 0 || self.timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout("actor runtime"));
        }
        Ok(())
    }
}

impl Default for ActorRuntimeConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout_secs: default_timeout(),
            api_token: None,
        }
    }
}

fn default_timeout() -> u64 {
    10
}
