//! The study-page template.
//!
//! The interactive agent asks the model for a small JSON payload and renders
//! it here, so every page shares one layout and one chat box. The rendered
//! page posts questions to `/guide/chat` with the `__SESSION_ID__`
//! placeholder, which the orchestrator replaces before storing.

use html_escape::encode_text;
use pathwise_core::KnowledgePoint;
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the real session id by the orchestrator.
pub const SESSION_ID_PLACEHOLDER: &str = "__SESSION_ID__";

/// Content of one study page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewPayload {
    pub title: String,
    pub concept: String,
    pub key_points: Vec<String>,
    pub example_problem: String,
    pub example_answer: String,
    pub check_question: String,
    pub next_hint: String,
}

fn text_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl ViewPayload {
    /// Page built from the knowledge point alone.
    pub fn from_knowledge(kp: &KnowledgePoint) -> Self {
        let mut key_points = Vec::new();
        if !kp.summary.trim().is_empty() {
            key_points.push(kp.summary.trim().to_string());
        }
        if !kp.difficulty.trim().is_empty() {
            key_points.push(format!("Common difficulty: {}", kp.difficulty.trim()));
        }
        Self {
            title: kp.title.clone(),
            concept: if kp.summary.trim().is_empty() {
                format!("Let's work through {}.", kp.title)
            } else {
                kp.summary.trim().to_string()
            },
            key_points,
            example_problem: format!("Try explaining {} with a small example.", kp.title),
            example_answer: "Write your own example first, then compare it with the concept above."
                .to_string(),
            check_question: format!("What is the key idea of {}?", kp.title),
            next_hint: "Ask a question below, or move on when you feel confident.".to_string(),
        }
    }

    /// Builds a payload from model output, filling missing fields from `kp`.
    ///
    /// Returns `None` when `value` is not a JSON object.
    pub fn normalize(value: &serde_json::Value, kp: &KnowledgePoint) -> Option<Self> {
        if !value.is_object() {
            return None;
        }
        let base = Self::from_knowledge(kp);

        let key_points: Vec<String> = value
            .get("key_points")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            title: text_field(value, "title").unwrap_or(base.title),
            concept: text_field(value, "concept").unwrap_or(base.concept),
            key_points: if key_points.is_empty() {
                base.key_points
            } else {
                key_points
            },
            example_problem: text_field(value, "example_problem").unwrap_or(base.example_problem),
            example_answer: text_field(value, "example_answer").unwrap_or(base.example_answer),
            check_question: text_field(value, "check_question").unwrap_or(base.check_question),
            next_hint: text_field(value, "next_hint").unwrap_or(base.next_hint),
        })
    }

    /// Renders the full HTML document.
    pub fn render(&self) -> String {
        let title = encode_text(&self.title);
        let concept = encode_text(&self.concept);
        let key_points: String = self
            .key_points
            .iter()
            .map(|p| format!("<li>{}</li>", encode_text(p)))
            .collect();
        let example_problem = encode_text(&self.example_problem);
        let example_answer = encode_text(&self.example_answer);
        let check_question = encode_text(&self.check_question);
        let next_hint = encode_text(&self.next_hint);
        // Serialized as a JS string literal; `<` escaped so the value cannot close the script tag.
        let check_js = serde_json::to_string(&self.check_question)
            .unwrap_or_else(|_| "\"\"".to_string())
            .replace('<', "\\u003c");
        let session_id = SESSION_ID_PLACEHOLDER;

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
  body {{ font-family: system-ui, sans-serif; max-width: 760px; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; color: #1f2933; }}
  h1 {{ font-size: 1.6rem; border-bottom: 2px solid #3e7bfa; padding-bottom: .4rem; }}
  section {{ margin: 1.4rem 0; }}
  .example {{ background: #f5f7fa; border-radius: 6px; padding: .8rem 1rem; }}
  details summary {{ cursor: pointer; color: #3e7bfa; }}
  .hint {{ color: #52606d; font-style: italic; }}
  #chat-log {{ border: 1px solid #d9e2ec; border-radius: 6px; min-height: 4rem; padding: .6rem; white-space: pre-wrap; }}
  #chat-form {{ display: flex; gap: .5rem; margin-top: .5rem; }}
  #chat-input {{ flex: 1; padding: .4rem; }}
</style>
</head>
<body>
<h1>{title}</h1>
<section>
  <h2>Concept</h2>
  <p>{concept}</p>
</section>
<section>
  <h2>Key points</h2>
  <ul>{key_points}</ul>
</section>
<section class="example">
  <h2>Example</h2>
  <p>{example_problem}</p>
  <details><summary>Show answer</summary><p>{example_answer}</p></details>
</section>
<section>
  <h2>Check yourself</h2>
  <p>{check_question}</p>
  <button type="button" id="ask-check">Ask the assistant about this</button>
</section>
<p class="hint">{next_hint}</p>
<section>
  <h2>Questions</h2>
  <div id="chat-log"></div>
  <form id="chat-form">
    <input id="chat-input" type="text" placeholder="Ask about this knowledge point" autocomplete="off">
    <button type="submit">Send</button>
  </form>
</section>
<script>
  const sessionId = "{session_id}";
  const checkQuestion = {check_js};
  const log = document.getElementById("chat-log");
  async function ask(message) {{
    log.textContent += "\nYou: " + message;
    try {{
      const resp = await fetch("/guide/chat", {{
        method: "POST",
        headers: {{ "Content-Type": "application/json" }},
        body: JSON.stringify({{ session_id: sessionId, message: message }})
      }});
      const data = await resp.json();
      log.textContent += "\nAssistant: " + (data.answer || data.error || "");
    }} catch (err) {{
      log.textContent += "\n(could not reach the assistant)";
    }}
  }}
  document.getElementById("chat-form").addEventListener("submit", (event) => {{
    event.preventDefault();
    const input = document.getElementById("chat-input");
    const message = input.value.trim();
    if (message) {{ input.value = ""; ask(message); }}
  }});
  document.getElementById("ask-check").addEventListener("click", () => ask(checkQuestion));
</script>
</body>
</html>
"#
        )
    }
}

/// The page substituted when the interactive agent cannot produce one.
pub fn fallback_document(kp: &KnowledgePoint) -> String {
    ViewPayload::from_knowledge(kp).render()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::extract::is_complete_document;

    fn kp() -> KnowledgePoint {
        KnowledgePoint::new("Attention", "Weighted sums over values.", "Scaling factor")
    }

    #[test]
    fn test_fallback_is_complete_and_escaped() {
        let point = KnowledgePoint::new("<b>Bold</b> & co", "", "");
        let html = fallback_document(&point);
        assert!(is_complete_document(&html));
        assert!(html.contains("&lt;b&gt;Bold&lt;/b&gt; &amp; co"));
        assert!(!html.contains("<b>Bold</b>"));
        assert!(html.contains(SESSION_ID_PLACEHOLDER));
    }

    #[test]
    fn test_normalize_fills_missing_fields() {
        let value = serde_json::json!({"concept": "Queries meet keys.", "key_points": ["", "softmax"]});
        let payload = ViewPayload::normalize(&value, &kp()).unwrap();
        assert_eq!(payload.title, "Attention");
        assert_eq!(payload.concept, "Queries meet keys.");
        assert_eq!(payload.key_points, vec!["softmax".to_string()]);
        assert!(payload.check_question.contains("Attention"));
    }

    #[test]
    fn test_normalize_rejects_non_object() {
        assert!(ViewPayload::normalize(&serde_json::json!(["a"]), &kp()).is_none());
    }

    #[test]
    fn test_check_question_cannot_close_script() {
        let mut payload = ViewPayload::from_knowledge(&kp());
        payload.check_question = "</script><script>alert(1)</script>".to_string();
        let html = payload.render();
        assert_eq!(html.matches("</script>").count(), 1);
    }
}
