use crate::agent::{Agent, AgentKind, ChatInput};
use crate::llm::LlmClient;
use crate::prompts::{language_line, with_repair, CHAT_PROMPT};
use async_trait::async_trait;
use pathwise_core::{ChatMessage, PathwiseError, PathwiseResult, Role};
use std::sync::Arc;
use tracing::debug;

/// Answers questions about the current knowledge point only.
pub struct ChatAgent {
    llm: Arc<LlmClient>,
    language: String,
}

impl ChatAgent {
    pub fn new(llm: Arc<LlmClient>, language: &str) -> Self {
        Self {
            llm,
            language: language.to_string(),
        }
    }

    fn build_user_prompt(&self, input: &ChatInput) -> String {
        let kp = &input.knowledge;
        let history = if input.history.is_empty() {
            "(no previous messages)".to_string()
        } else {
            format_history(&input.history)
        };
        format!(
            "Current knowledge point:\n- Title: {}\n- Summary: {}\n- Learner difficulty: {}\n\n\
             Conversation so far:\n{history}\n\nQuestion:\n{}\n\n{}",
            kp.title,
            kp.summary,
            kp.difficulty,
            input.question.trim(),
            language_line(&self.language),
        )
    }
}

pub(crate) fn format_message(message: &ChatMessage) -> String {
    match message.role {
        Role::User => format!("**User**: {}", message.content),
        Role::Assistant => format!("**Assistant**: {}", message.content),
        Role::System => format!("_System: {}_", message.content),
    }
}

fn format_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(format_message)
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Agent for ChatAgent {
    type Input = ChatInput;
    type Output = String;

    fn kind(&self) -> AgentKind {
        AgentKind::Chat
    }

    async fn generate(&self, input: &ChatInput) -> PathwiseResult<String> {
        if input.question.trim().is_empty() {
            return Err(PathwiseError::InvalidRequest("question is empty".into()));
        }
        let prompt = with_repair(self.build_user_prompt(input), input.repair_hint.as_deref());
        debug!(title = %input.knowledge.title, history = input.history.len(), "Answering question");

        let answer = self.llm.complete(CHAT_PROMPT, &prompt, false).await?;
        Ok(answer.trim().to_string())
    }
}
