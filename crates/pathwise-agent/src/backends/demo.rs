use super::{CompletionRequest, LlmBackend};
use async_trait::async_trait;
use pathwise_core::PathwiseResult;

/// Deterministic offline backend for demos and smoke tests.
///
/// Routes on the role line of the system prompt and builds its answer from
/// the titles found in the user prompt, so the same input always yields the
/// same plan, view, answer and summary.
#[derive(Debug, Default)]
pub struct DemoBackend;

impl DemoBackend {
    pub fn new() -> Self {
        Self
    }
}

fn values_after<'a>(text: &'a str, prefix: &str) -> Vec<&'a str> {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix(prefix))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .collect()
}

fn plan(user_prompt: &str) -> String {
    let titles = values_after(user_prompt, "**Title**:");
    let points: Vec<serde_json::Value> = if titles.is_empty() {
        vec![serde_json::json!({
            "knowledge_title": "Getting Started",
            "knowledge_summary": "An overview of the material in the provided records.",
            "user_difficulty": "Knowing where to begin.",
        })]
    } else {
        titles
            .iter()
            .map(|title| {
                serde_json::json!({
                    "knowledge_title": title,
                    "knowledge_summary": format!("The core ideas behind {title}, built up from the basics."),
                    "user_difficulty": format!("Connecting {title} to what came before."),
                })
            })
            .collect()
    };
    serde_json::json!({ "knowledge_points": points }).to_string()
}

fn view(user_prompt: &str) -> String {
    let title = values_after(user_prompt, "- Title:")
        .first()
        .copied()
        .unwrap_or("Knowledge Point");
    serde_json::json!({
        "title": title,
        "concept": format!("{title} explained step by step."),
        "key_points": [
            format!("What {title} is."),
            format!("Why {title} matters."),
            "How to recognise it in practice.",
        ],
        "example_problem": format!("Give a small example of {title}."),
        "example_answer": format!("A minimal worked example of {title}."),
        "check_question": format!("In your own words, what is {title}?"),
        "next_hint": "Move on when you can explain it without notes.",
    })
    .to_string()
}

fn answer(user_prompt: &str) -> String {
    let title = values_after(user_prompt, "- Title:")
        .first()
        .copied()
        .unwrap_or("this topic");
    format!(
        "Good question. For **{title}**, start from the definition, then work through \
         one small example.\n\n- Which part feels unclear: the idea, the notation, or \
         where it is used?"
    )
}

fn summary(user_prompt: &str) -> String {
    let titles: Vec<&str> = user_prompt
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("### Knowledge Point ")?;
            rest.split_once(':').map(|(_, title)| title.trim())
        })
        .collect();
    let mut out = String::from("# Learning Summary\n\n");
    for title in &titles {
        out.push_str(&format!("- **{title}**: covered.\n"));
    }
    out.push_str("\nNext step: revisit each point and explain it to someone else.\n");
    out
}

#[async_trait]
impl LlmBackend for DemoBackend {
    async fn complete(&self, request: &CompletionRequest) -> PathwiseResult<String> {
        let system = request.system_prompt.to_lowercase();
        let user = request.user_prompt.as_str();
        let reply = if system.contains("learning planner") {
            plan(user)
        } else if system.contains("interactive learning designer") {
            view(user)
        } else if system.contains("intelligent learning assistant") {
            answer(user)
        } else if system.contains("learning summary expert") {
            summary(user)
        } else {
            "Unknown call.".to_string()
        };
        Ok(reply)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plan_follows_record_titles() {
        let backend = DemoBackend::new();
        let request = CompletionRequest::new(
            "You are a learning planner.",
            "### Record 1 [SOLVE]\n**Title**: Attention\n---\n### Record 2 [QUESTION]\n**Title**: Masking\n",
        );
        let reply = backend.complete(&request).await.unwrap();
        let json: serde_json::Value = serde_json::from_str(&reply).unwrap();
        let points = json["knowledge_points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["knowledge_title"], "Attention");
        assert_eq!(points[1]["knowledge_title"], "Masking");
    }

    #[tokio::test]
    async fn test_summary_lists_titles() {
        let backend = DemoBackend::new();
        let request = CompletionRequest::new(
            "You are a learning summary expert.",
            "### Knowledge Point 1: Attention\n### Knowledge Point 2: Masking\n",
        );
        let reply = backend.complete(&request).await.unwrap();
        assert!(reply.contains("**Attention**"));
        assert!(reply.contains("**Masking**"));
    }

    #[tokio::test]
    async fn test_unknown_prompt() {
        let backend = DemoBackend::new();
        let reply = backend
            .complete(&CompletionRequest::new("hello", "world"))
            .await
            .unwrap();
        assert_eq!(reply, "Unknown call.");
    }
}
