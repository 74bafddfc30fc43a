//! Generation agents and model-provider plumbing.
//!
//! The [`Agent`] trait has four implementations, one per [`AgentKind`]; the
//! LLM-backed ones share an [`LlmClient`] that talks to an OpenAI-compatible
//! endpoint, the offline demo backend, or a failover chain of both.

pub mod agent;
pub mod agents;
pub mod backends;
pub mod config;
pub mod extract;
pub mod failover;
pub mod llm;
mod prompts;
pub mod view;

pub use agent::{
    Agent, AgentKind, AgentSet, ChatInput, DynChatAgent, DynInteractiveAgent, DynLocateAgent,
    DynSummaryAgent, InteractiveInput, LocateInput, SummaryInput,
};
pub use backends::{CompletionRequest, LlmBackend};
pub use config::{LlmProvider, ModelConfig};
pub use failover::{FailoverBackend, RetryPolicy};
pub use llm::LlmClient;
pub use view::{fallback_document, ViewPayload, SESSION_ID_PLACEHOLDER};
