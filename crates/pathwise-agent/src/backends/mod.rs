pub mod demo;
pub mod openai;

use async_trait::async_trait;
use pathwise_core::PathwiseResult;

/// A single text-completion request: one system prompt, one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            json_mode: false,
        }
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Trait for LLM provider backends.
///
/// Each provider (OpenAI-compatible, demo, failover chain) implements this
/// trait to handle API communication.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `LlmBackend` for your struct
/// 3. Add the variant to `LlmProvider` enum in `config.rs`
/// 4. Wire it up in `LlmClient::new()` in `llm.rs`
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Returns the raw text of the model's reply.
    async fn complete(&self, request: &CompletionRequest) -> PathwiseResult<String>;
}
