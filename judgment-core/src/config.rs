//! SDK configuration.
//!
//! Uses `figment` for layered configuration: defaults -> environment
//! (`JUDGMENT_`-prefixed variables). Resolution happens once, at the
//! application boundary; the resulting [`JudgmentConfig`] is passed
//! explicitly into the API client and orchestrator. There is no lazy
//! singleton and no environment lookup inside the core pipeline.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{JudgmentError, Result};

/// Default base URL of the Judgment evaluation backend.
pub const DEFAULT_API_URL: &str = "https://api.judgmentlabs.ai";

/// Connection settings for the Judgment backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentConfig {
    /// API key, sent as `Authorization: Bearer <key>`.
    pub api_key: String,
    /// Organization identifier, sent as `X-Organization-Id`.
    pub organization_id: String,
    /// Base URL of the backend.
    pub api_url: String,
}

impl Default for JudgmentConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            organization_id: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

impl JudgmentConfig {
    /// Create a config with explicit credentials and the default API URL.
    pub fn new(api_key: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            organization_id: organization_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Override the backend base URL.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Resolve configuration from the environment.
    ///
    /// Layers `JUDGMENT_API_KEY`, `JUDGMENT_ORGANIZATION_ID`, and
    /// `JUDGMENT_API_URL` over the defaults, then validates that the
    /// credentials are present.
    pub fn from_env() -> Result<Self> {
        let config: JudgmentConfig =
            Figment::from(Serialized::defaults(JudgmentConfig::default()))
                .merge(Env::prefixed("JUDGMENT_"))
                .extract()
                .map_err(|e| JudgmentError::Config {
                    message: e.to_string(),
                })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the credentials required for every backend call are set.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(JudgmentError::Config {
                message: "api_key is not set (JUDGMENT_API_KEY)".into(),
            });
        }
        if self.organization_id.is_empty() {
            return Err(JudgmentError::Config {
                message: "organization_id is not set (JUDGMENT_ORGANIZATION_ID)".into(),
            });
        }
        if self.api_url.is_empty() {
            return Err(JudgmentError::Config {
                message: "api_url is empty".into(),
            });
        }
        Ok(())
    }
}
