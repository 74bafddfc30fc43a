use super::chat::format_message;
use crate::agent::{Agent, AgentKind, SummaryInput};
use crate::llm::LlmClient;
use crate::prompts::{language_line, with_repair, SUMMARY_PROMPT};
use async_trait::async_trait;
use pathwise_core::{ChatMessage, KnowledgePoint, PathwiseResult};
use std::sync::Arc;
use tracing::debug;

/// Writes the end-of-run report.
pub struct SummaryAgent {
    llm: Arc<LlmClient>,
    language: String,
}

impl SummaryAgent {
    pub fn new(llm: Arc<LlmClient>, language: &str) -> Self {
        Self {
            llm,
            language: language.to_string(),
        }
    }

    fn build_user_prompt(&self, input: &SummaryInput) -> String {
        format!(
            "Notebook: {}\n\nKnowledge points:\n{}\n\nLearning history:\n{}\n\n{}",
            input.notebook_name,
            format_points(&input.knowledge_points),
            format_grouped_history(&input.chat_history),
            language_line(&self.language),
        )
    }
}

fn format_points(points: &[KnowledgePoint]) -> String {
    points
        .iter()
        .enumerate()
        .map(|(i, kp)| {
            format!(
                "### Knowledge Point {}: {}\n{}\nDifficulty: {}",
                i + 1,
                kp.title,
                kp.summary,
                kp.difficulty
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Messages in order, with a header whenever the knowledge index changes.
fn format_grouped_history(history: &[ChatMessage]) -> String {
    if history.is_empty() {
        return "(no messages)".to_string();
    }
    let mut out = String::new();
    let mut current: Option<usize> = None;
    for message in history {
        if current != Some(message.knowledge_index) {
            current = Some(message.knowledge_index);
            out.push_str(&format!(
                "\n--- During knowledge point {} ---\n",
                message.knowledge_index + 1
            ));
        }
        out.push_str(&format_message(message));
        out.push('\n');
    }
    out.trim().to_string()
}

#[async_trait]
impl Agent for SummaryAgent {
    type Input = SummaryInput;
    type Output = String;

    fn kind(&self) -> AgentKind {
        AgentKind::Summary
    }

    async fn generate(&self, input: &SummaryInput) -> PathwiseResult<String> {
        let prompt = with_repair(self.build_user_prompt(input), input.repair_hint.as_deref());
        debug!(
            points = input.knowledge_points.len(),
            messages = input.chat_history.len(),
            "Writing summary"
        );
        let report = self.llm.complete(SUMMARY_PROMPT, &prompt, false).await?;
        Ok(report.trim().to_string())
    }
}
