//! API key authentication

use anyhow::{Context, Result};

/// Environment variables checked for a key, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// API key authentication handler
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl ApiKeyAuth {
    /// Create from an API key string
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Load API key from the environment
    pub fn from_env() -> Result<Self> {
        Self::resolve(None, |name| std::env::var(name).ok())
    }

    /// Resolve a key from the configured value, falling back to `lookup` for
    /// each of [`API_KEY_ENV_VARS`]
    pub fn resolve(
        configured: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let api_key = configured
            .map(str::to_string)
            .or_else(|| API_KEY_ENV_VARS.iter().find_map(|&name| lookup(name)))
            .context("No API key configured (set gemini.api_key or GEMINI_API_KEY)")?;

        let auth = Self::new(api_key);
        auth.validate()?;
        Ok(auth)
    }

    /// Get the API key
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Validate the API key format
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            anyhow::bail!("API key is empty");
        }
        if self.api_key.chars().any(char::is_whitespace) {
            anyhow::bail!("API key must not contain whitespace");
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth").field("api_key", &"<redacted>").finish()
    }
}
