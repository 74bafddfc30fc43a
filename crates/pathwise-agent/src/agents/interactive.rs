use crate::agent::{Agent, AgentKind, InteractiveInput};
use crate::extract::{extract_html, extract_json};
use crate::llm::LlmClient;
use crate::prompts::{language_line, with_repair, INTERACTIVE_PROMPT};
use crate::view::ViewPayload;
use async_trait::async_trait;
use pathwise_core::{PathwiseError, PathwiseResult};
use std::sync::Arc;
use tracing::debug;

/// How much of a broken page is quoted back to the model.
const PREVIOUS_HTML_EXCERPT_CHARS: usize = 4000;

/// Designs the study page for one knowledge point.
pub struct InteractiveAgent {
    llm: Arc<LlmClient>,
    language: String,
}

impl InteractiveAgent {
    pub fn new(llm: Arc<LlmClient>, language: &str) -> Self {
        Self {
            llm,
            language: language.to_string(),
        }
    }

    fn build_user_prompt(&self, input: &InteractiveInput) -> String {
        let kp = &input.knowledge;
        let mut prompt = format!(
            "Knowledge point:\n- Title: {}\n- Summary: {}\n- Learner difficulty: {}\n",
            kp.title, kp.summary, kp.difficulty
        );
        if let Some(bug) = input.bug_description.as_deref() {
            prompt.push_str(&format!(
                "\nThe learner reported a problem with the current page:\n{bug}\n"
            ));
            if let Some(previous) = input.previous_html.as_deref() {
                let excerpt: String = previous.chars().take(PREVIOUS_HTML_EXCERPT_CHARS).collect();
                prompt.push_str(&format!("\nCurrent page (excerpt):\n{excerpt}\n"));
            }
            prompt.push_str("\nProduce a corrected page for the same knowledge point.\n");
        }
        prompt.push('\n');
        prompt.push_str(&language_line(&self.language));
        prompt
    }
}

#[async_trait]
impl Agent for InteractiveAgent {
    type Input = InteractiveInput;
    type Output = String;

    fn kind(&self) -> AgentKind {
        AgentKind::Interactive
    }

    async fn generate(&self, input: &InteractiveInput) -> PathwiseResult<String> {
        let prompt = with_repair(self.build_user_prompt(input), input.repair_hint.as_deref());
        debug!(
            title = %input.knowledge.title,
            fixing = input.bug_description.is_some(),
            "Designing view"
        );

        let raw = self.llm.complete(INTERACTIVE_PROMPT, &prompt, true).await?;

        if let Some(payload) =
            extract_json(&raw).and_then(|value| ViewPayload::normalize(&value, &input.knowledge))
        {
            return Ok(payload.render());
        }
        if let Some(html) = extract_html(&raw) {
            return Ok(html.to_string());
        }
        Err(PathwiseError::AgentOutput(
            "designer output was neither a view payload nor an HTML document".into(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backends::demo::DemoBackend;
    use pathwise_core::KnowledgePoint;

    fn agent() -> InteractiveAgent {
        InteractiveAgent::new(Arc::new(LlmClient::from_backend(Box::new(DemoBackend::new()))), "en")
    }

    #[test]
    fn test_fix_prompt_quotes_bug_and_page() {
        let mut input = InteractiveInput::fresh(KnowledgePoint::new("Masking", "s", "d"));
        input.bug_description = Some("the button does nothing".into());
        input.previous_html = Some("<html>old</html>".into());
        let prompt = agent().build_user_prompt(&input);
        assert!(prompt.contains("- Title: Masking"));
        assert!(prompt.contains("the button does nothing"));
        assert!(prompt.contains("<html>old</html>"));
    }

    #[tokio::test]
    async fn test_demo_payload_is_rendered() {
        let input = InteractiveInput::fresh(KnowledgePoint::new("Masking", "s", "d"));
        let html = agent().generate(&input).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Masking</h1>"));
    }
}
