use crate::failover::RetryPolicy;
use pathwise_core::{PathwiseError, PathwiseResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAi,
    OpenRouter,
    /// Groq cloud inference, OpenAI-compatible API.
    Groq,
    /// Deterministic offline responses. No network, no API key.
    Demo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: LlmProvider,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    /// Empty means "resolve from the environment" (see [`ModelConfig::resolve_api_key`]).
    #[serde(default)]
    pub api_key: String,
    pub api_base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub fallback_models: Vec<ModelConfig>,
    #[serde(default)]
    pub retry_policy: Option<RetryPolicy>,
}

fn default_model_id() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_max_tokens() -> u32 {
    8000
}

impl ModelConfig {
    /// Offline configuration used when no config file is present.
    pub fn demo() -> Self {
        Self {
            provider: LlmProvider::Demo,
            model_id: "demo".to_string(),
            api_key: String::new(),
            api_base_url: None,
            temperature: 0.0,
            max_tokens: default_max_tokens(),
            fallback_models: Vec::new(),
            retry_policy: None,
        }
    }

    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url.trim_end_matches('/')
        } else {
            match self.provider {
                LlmProvider::OpenAi => "https://api.openai.com",
                LlmProvider::OpenRouter => "https://openrouter.ai/api",
                LlmProvider::Groq => "https://api.groq.com/openai",
                LlmProvider::Demo => "local://demo",
            }
        }
    }

    /// Fills an empty `api_key` from `LLM_API_KEY`, then `OPENAI_API_KEY`.
    /// Applies to fallback models as well.
    pub fn resolve_api_key(&mut self) {
        if self.api_key.is_empty() && self.provider != LlmProvider::Demo {
            self.api_key = std::env::var("LLM_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .unwrap_or_default();
        }
        for fallback in &mut self.fallback_models {
            fallback.resolve_api_key();
        }
    }

    /// Rejects configurations that cannot reach a provider.
    pub fn validate(&self) -> PathwiseResult<()> {
        if self.model_id.trim().is_empty() {
            return Err(PathwiseError::Config("model_id is empty".into()));
        }
        if self.provider != LlmProvider::Demo && self.api_key.is_empty() {
            return Err(PathwiseError::Config(format!(
                "no API key for provider {:?}: set model.api_key, LLM_API_KEY or OPENAI_API_KEY",
                self.provider
            )));
        }
        self.fallback_models.iter().try_for_each(Self::validate)
    }
}
