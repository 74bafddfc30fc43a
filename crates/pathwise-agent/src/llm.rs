use crate::backends::demo::DemoBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{CompletionRequest, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use crate::failover::FailoverBackend;
use pathwise_core::PathwiseResult;
use tracing::debug;

/// LLM client that dispatches to the correct provider backend.
///
/// Uses the `LlmBackend` trait to abstract away provider-specific API differences.
/// When the config lists fallback models or a retry policy, the primary and
/// fallback backends are chained behind a [`FailoverBackend`].
pub struct LlmClient {
    backend: Box<dyn LlmBackend>,
}

fn single_backend(config: ModelConfig) -> Box<dyn LlmBackend> {
    match config.provider {
        LlmProvider::OpenAi | LlmProvider::OpenRouter | LlmProvider::Groq => {
            Box::new(OpenAiBackend::new(config))
        }
        LlmProvider::Demo => Box::new(DemoBackend::new()),
    }
}

impl LlmClient {
    pub fn new(mut config: ModelConfig) -> Self {
        let fallbacks = std::mem::take(&mut config.fallback_models);
        let policy = config.retry_policy.take();

        if fallbacks.is_empty() && policy.is_none() {
            return Self {
                backend: single_backend(config),
            };
        }

        let mut backends = vec![single_backend(config)];
        backends.extend(fallbacks.into_iter().map(single_backend));
        Self {
            backend: Box::new(FailoverBackend::new(backends, policy.unwrap_or_default())),
        }
    }

    /// Create from a pre-built backend (for custom/external providers).
    pub fn from_backend(backend: Box<dyn LlmBackend>) -> Self {
        Self { backend }
    }

    /// One system prompt, one user turn, raw text back.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        json_mode: bool,
    ) -> PathwiseResult<String> {
        let mut request = CompletionRequest::new(system_prompt, user_prompt);
        request.json_mode = json_mode;
        debug!(prompt_chars = user_prompt.len(), json_mode, "Sending completion");
        self.backend.complete(&request).await
    }
}
