//! Runtime configuration.
//!
//! Settings come from built-in defaults, an optional TOML file and an
//! environment lookup supplied by the caller. Nothing in the library reads
//! process-wide state on its own, so every run can be configured in
//! isolation.
//!
//! ```toml
//! [summarizer]
//! provider = "groq"
//! model = "llama3-8b-8192"
//! fallback_model = "llama-3.1-8b-instant"
//! temperature = 0.3
//!
//! [pipeline]
//! chunk_size = 3000
//! failure_policy = "abort"
//! ```

use clap::ValueEnum;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::RingkasError;
use crate::model::ModelRequest;
use crate::prompts::{
    user_message, DEFAULT_CONSOLIDATION_PROMPT, DEFAULT_SUMMARY_PROMPT, DEFAULT_SYSTEM_PROMPT,
};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_MIN_LENGTH: usize = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

pub const MODEL_ENV: &str = "RINGKAS_MODEL";
pub const FALLBACK_MODEL_ENV: &str = "RINGKAS_FALLBACK_MODEL";
pub const BASE_URL_ENV: &str = "RINGKAS_BASE_URL";

/// Hosted chat-completion providers with an OpenAI-compatible API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    #[serde(rename = "openai")]
    #[value(name = "openai")]
    OpenAi,
    Groq,
}

impl Provider {
    pub fn base_url(&self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Groq => "https://api.groq.com/openai/v1",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Groq => "llama3-8b-8192",
        }
    }

    pub fn default_fallback_model(&self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-3.5-turbo",
            Provider::Groq => "llama-3.1-8b-instant",
        }
    }

    /// Environment variable holding the API key for this provider.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }
}

/// What the pipeline does when a chunk cannot be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and carry on with the remaining chunks
    #[default]
    Skip,
    /// Stop the whole run at the first failed chunk
    Abort,
}

/// Configuration for the summarization client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummarizerConfig {
    pub provider: Provider,
    /// Overrides the provider's base URL (proxies, self-hosted gateways)
    pub base_url: Option<String>,
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// Primary model; the provider default when unset
    pub model: Option<String>,
    /// Substitute for a retired primary model. An empty string disables the
    /// fallback; unset means the provider default.
    pub fallback_model: Option<String>,
    pub system_prompt: String,
    pub summary_prompt: String,
    pub consolidation_prompt: String,
    pub temperature: f64,
    pub max_tokens: Option<u64>,
    pub timeout_secs: u64,
    /// Use the offline summarizer when no key is set or a remote call fails
    pub local_fallback: bool,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            base_url: None,
            api_key: None,
            model: None,
            fallback_model: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            summary_prompt: DEFAULT_SUMMARY_PROMPT.to_string(),
            consolidation_prompt: DEFAULT_CONSOLIDATION_PROMPT.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            local_fallback: true,
        }
    }
}

impl SummarizerConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn with_local_fallback(mut self, enabled: bool) -> Self {
        self.local_fallback = enabled;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, tokens: Option<u64>) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn primary_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.provider.default_model())
    }

    pub fn fallback_model(&self) -> Option<&str> {
        match self.fallback_model.as_deref() {
            Some(model) if model.trim().is_empty() => None,
            Some(model) => Some(model),
            None => Some(self.provider.default_fallback_model()),
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.base_url())
    }

    /// The configured key, treating a blank value as absent.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_ref()
            .map(|key| key.expose_secret())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn has_credential(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Request for the primary model summarizing `text` with `instruction`.
    pub fn request(&self, instruction: &str, text: &str) -> ModelRequest {
        ModelRequest {
            model: self.primary_model().to_string(),
            system_prompt: self.system_prompt.clone(),
            user_content: user_message(instruction, text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Options for the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineOptions {
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Texts shorter than this (in characters) are not summarized
    pub min_length: usize,
    pub failure_policy: FailurePolicy,
    /// Run a second pass over the joined partial summaries
    pub consolidate: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            min_length: DEFAULT_MIN_LENGTH,
            failure_policy: FailurePolicy::default(),
            consolidate: false,
        }
    }
}

impl PipelineOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_consolidation(mut self, consolidate: bool) -> Self {
        self.consolidate = consolidate;
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub summarizer: SummarizerConfig,
    pub pipeline: PipelineOptions,
}

impl Settings {
    pub fn from_toml_str(contents: &str) -> Result<Self, RingkasError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load from a TOML file, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, RingkasError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|e| {
                    RingkasError::Config(format!("cannot read '{}': {}", path.display(), e))
                })?;
                Self::from_toml_str(&contents)
            }
            None => Ok(Self::default()),
        }
    }

    /// Overlay values from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = get(self.summarizer.provider.api_key_env()) {
            self.summarizer.api_key = Some(SecretString::from(key));
        }
        if let Some(model) = get(MODEL_ENV) {
            self.summarizer.model = Some(model);
        }
        if let Some(model) = get(FALLBACK_MODEL_ENV) {
            self.summarizer.fallback_model = Some(model);
        }
        if let Some(url) = get(BASE_URL_ENV) {
            self.summarizer.base_url = Some(url);
        }
    }

    pub fn validate(&self) -> Result<(), RingkasError> {
        if self.pipeline.chunk_size == 0 {
            return Err(RingkasError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.summarizer.temperature) {
            return Err(RingkasError::Config(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.summarizer.temperature
            )));
        }
        if self.summarizer.timeout_secs == 0 {
            return Err(RingkasError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pipeline.chunk_size, 2000);
        assert_eq!(settings.pipeline.min_length, 500);
        assert_eq!(settings.pipeline.failure_policy, FailurePolicy::Skip);
        assert_eq!(settings.summarizer.primary_model(), "gpt-4o-mini");
        assert_eq!(settings.summarizer.timeout(), Duration::from_secs(60));
        assert!(!settings.summarizer.has_credential());
    }

    #[test]
    fn test_parse_toml() {
        let settings = Settings::from_toml_str(
            r#"
[summarizer]
provider = "groq"
fallback_model = ""
temperature = 0.5

[pipeline]
chunk_size = 4000
failure_policy = "abort"
consolidate = true
"#,
        )
        .unwrap();

        assert_eq!(settings.summarizer.provider, Provider::Groq);
        assert_eq!(settings.summarizer.primary_model(), "llama3-8b-8192");
        assert_eq!(settings.summarizer.fallback_model(), None);
        assert_eq!(
            settings.summarizer.base_url(),
            "https://api.groq.com/openai/v1"
        );
        assert_eq!(settings.pipeline.chunk_size, 4000);
        assert_eq!(settings.pipeline.min_length, 500);
        assert_eq!(settings.pipeline.failure_policy, FailurePolicy::Abort);
        assert!(settings.pipeline.consolidate);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Settings::from_toml_str("[pipeline]\nchunk_sise = 10\n");
        assert!(matches!(result, Err(RingkasError::Config(_))));
    }

    #[test]
    fn test_env_overlay_uses_provider_key() {
        let env: HashMap<&str, &str> = [
            ("GROQ_API_KEY", "gsk-test"),
            ("OPENAI_API_KEY", "sk-ignored"),
            (MODEL_ENV, "llama-3.3-70b-versatile"),
        ]
        .into_iter()
        .collect();

        let mut settings = Settings::default();
        settings.summarizer.provider = Provider::Groq;
        settings.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.summarizer.api_key(), Some("gsk-test"));
        assert_eq!(settings.summarizer.primary_model(), "llama-3.3-70b-versatile");
    }

    #[test]
    fn test_blank_key_is_no_credential() {
        let config = SummarizerConfig::default().with_api_key("   ");
        assert!(!config.has_credential());
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let mut settings = Settings::default();
        settings.pipeline.chunk_size = 0;
        assert!(settings.validate().is_err());
    }
}
