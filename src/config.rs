//! Runtime settings.
//!
//! Values come from command-line flags or environment variables (both
//! handled by the binary's argument parser) and fall back to the
//! [`SecretStore`].

use crate::{
    agent::Agent,
    backends::openai,
    builder::LLMBuilder,
    comeback::comeback_agent,
    error::LLMError,
    secret_store::SecretStore,
    tools::GiphyTools,
};

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const GIPHY_API_KEY: &str = "GIPHY_API_KEY";
pub const AUTH_KEY: &str = "COMEBACK_AUTH_KEY";

/// Default listen address
pub const DEFAULT_ADDR: &str = "127.0.0.1:8501";

/// Resolved settings for one process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    pub giphy_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub giphy_base_url: Option<String>,
    pub model: String,
    pub addr: String,
    pub timeout_seconds: Option<u64>,
    pub auth_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            giphy_api_key: None,
            openai_base_url: None,
            giphy_base_url: None,
            model: openai::DEFAULT_MODEL.to_string(),
            addr: DEFAULT_ADDR.to_string(),
            timeout_seconds: None,
            auth_key: None,
        }
    }
}

impl Settings {
    /// Fills keys that were not given explicitly from the secret store.
    pub fn with_store(mut self, store: &SecretStore) -> Self {
        let fill = |slot: &mut Option<String>, key: &str| {
            if slot.as_deref().map_or(true, str::is_empty) {
                if let Some(v) = store.get(key) {
                    *slot = Some(v.clone());
                }
            }
        };
        fill(&mut self.openai_api_key, OPENAI_API_KEY);
        fill(&mut self.giphy_api_key, GIPHY_API_KEY);
        fill(&mut self.auth_key, AUTH_KEY);
        self
    }

    pub fn openai_key(&self) -> Result<&str, LLMError> {
        non_empty(&self.openai_api_key)
            .ok_or_else(|| LLMError::AuthError("Please provide your OpenAI API key.".to_string()))
    }

    pub fn giphy_key(&self) -> Result<&str, LLMError> {
        non_empty(&self.giphy_api_key)
            .ok_or_else(|| LLMError::AuthError("Please provide your Giphy API key.".to_string()))
    }

    /// LLM configuration derived from these settings, with retries enabled.
    pub fn llm_builder(&self) -> Result<LLMBuilder, LLMError> {
        let mut builder = LLMBuilder::new()
            .api_key(self.openai_key()?)
            .model(&self.model)
            .resilient(true);
        if let Some(url) = &self.openai_base_url {
            builder = builder.base_url(url);
        }
        if let Some(t) = self.timeout_seconds {
            builder = builder.timeout_seconds(t);
        }
        Ok(builder)
    }

    pub fn giphy_tools(&self) -> Result<GiphyTools, LLMError> {
        let mut gifs = GiphyTools::new(self.giphy_key()?);
        if let Some(url) = &self.giphy_base_url {
            gifs = gifs.base_url(url);
        }
        if let Some(t) = self.timeout_seconds {
            gifs = gifs.timeout_seconds(t);
        }
        Ok(gifs)
    }

    /// Builds the comeback agent, failing early if either API key is missing.
    pub fn build_agent(&self) -> Result<Agent, LLMError> {
        comeback_agent(self.llm_builder()?, self.giphy_tools()?)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_use_friendly_messages() {
        let settings = Settings::default();
        assert_eq!(
            settings.build_agent().err().unwrap().to_string(),
            "Auth Error: Please provide your OpenAI API key."
        );

        let settings = Settings {
            openai_api_key: Some("sk-test".into()),
            giphy_api_key: Some("  ".into()),
            ..Settings::default()
        };
        assert_eq!(
            settings.build_agent().err().unwrap().to_string(),
            "Auth Error: Please provide your Giphy API key."
        );
    }

    #[test]
    fn store_fills_only_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SecretStore::open(dir.path().join("secrets.json")).unwrap();
        store.set(OPENAI_API_KEY, "sk-from-store").unwrap();
        store.set(GIPHY_API_KEY, "giphy-from-store").unwrap();

        let settings = Settings {
            openai_api_key: Some("sk-explicit".into()),
            ..Settings::default()
        }
        .with_store(&store);

        assert_eq!(settings.openai_key().unwrap(), "sk-explicit");
        assert_eq!(settings.giphy_key().unwrap(), "giphy-from-store");
        assert!(settings.auth_key.is_none());
        assert!(settings.build_agent().is_ok());
    }
}
