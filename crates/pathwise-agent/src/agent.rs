use crate::agents::{ChatAgent, InteractiveAgent, LocateAgent, SummaryAgent};
use crate::llm::LlmClient;
use async_trait::async_trait;
use pathwise_core::{ChatMessage, KnowledgePoint, PathwiseResult, Record};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The four generation variants of a guided-learning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    /// Records → ordered knowledge points.
    Locate,
    /// Knowledge point → study page.
    Interactive,
    /// Question about the current point → answer.
    Chat,
    /// Whole run → summary report.
    Summary,
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locate => "locate",
            Self::Interactive => "interactive",
            Self::Chat => "chat",
            Self::Summary => "summary",
        };
        f.write_str(name)
    }
}

/// A text-generation capability with a typed input and output.
#[async_trait]
pub trait Agent: Send + Sync {
    type Input: Send + Sync;
    type Output: Send;

    fn kind(&self) -> AgentKind;

    async fn generate(&self, input: &Self::Input) -> PathwiseResult<Self::Output>;
}

#[derive(Debug, Clone, Default)]
pub struct LocateInput {
    pub records: Vec<Record>,
    pub notebook_id: String,
    pub notebook_name: String,
    /// Validation failure of the previous attempt, if this is a retry.
    pub repair_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InteractiveInput {
    pub knowledge: KnowledgePoint,
    /// Set together with `bug_description` when repairing a page.
    pub previous_html: Option<String>,
    pub bug_description: Option<String>,
    pub repair_hint: Option<String>,
}

impl InteractiveInput {
    pub fn fresh(knowledge: KnowledgePoint) -> Self {
        Self {
            knowledge,
            previous_html: None,
            bug_description: None,
            repair_hint: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatInput {
    pub knowledge: KnowledgePoint,
    /// Already scoped to `knowledge` and capped by the caller.
    pub history: Vec<ChatMessage>,
    pub question: String,
    pub repair_hint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub notebook_name: String,
    pub knowledge_points: Vec<KnowledgePoint>,
    pub chat_history: Vec<ChatMessage>,
    pub repair_hint: Option<String>,
}

pub type DynLocateAgent = Arc<dyn Agent<Input = LocateInput, Output = Vec<KnowledgePoint>>>;
pub type DynInteractiveAgent = Arc<dyn Agent<Input = InteractiveInput, Output = String>>;
pub type DynChatAgent = Arc<dyn Agent<Input = ChatInput, Output = String>>;
pub type DynSummaryAgent = Arc<dyn Agent<Input = SummaryInput, Output = String>>;

/// One agent per [`AgentKind`], shared by every session of an orchestrator.
#[derive(Clone)]
pub struct AgentSet {
    pub locate: DynLocateAgent,
    pub interactive: DynInteractiveAgent,
    pub chat: DynChatAgent,
    pub summary: DynSummaryAgent,
}

impl AgentSet {
    /// All four agents backed by one shared model client.
    pub fn llm_backed(llm: Arc<LlmClient>, language: &str, max_record_output_chars: usize) -> Self {
        Self {
            locate: Arc::new(LocateAgent::new(llm.clone(), language, max_record_output_chars)),
            interactive: Arc::new(InteractiveAgent::new(llm.clone(), language)),
            chat: Arc::new(ChatAgent::new(llm.clone(), language)),
            summary: Arc::new(SummaryAgent::new(llm, language)),
        }
    }
}

impl fmt::Debug for AgentSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentSet")
            .field("locate", &self.locate.kind())
            .field("interactive", &self.interactive.kind())
            .field("chat", &self.chat.kind())
            .field("summary", &self.summary.kind())
            .finish()
    }
}
