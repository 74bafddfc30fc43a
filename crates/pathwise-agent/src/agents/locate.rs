use crate::agent::{Agent, AgentKind, LocateInput};
use crate::extract::extract_json;
use crate::llm::LlmClient;
use crate::prompts::{language_line, with_repair, LOCATE_PROMPT};
use async_trait::async_trait;
use pathwise_core::{KnowledgePoint, PathwiseError, PathwiseResult, Record};
use std::sync::Arc;
use tracing::{debug, info};

const TRUNCATION_MARKER: &str = "\n...[truncated]...";

/// Keys under which models tend to nest the point list.
const LIST_KEYS: [&str; 4] = ["knowledge_points", "points", "data", "items"];

/// Turns interaction records into an ordered list of knowledge points.
pub struct LocateAgent {
    llm: Arc<LlmClient>,
    language: String,
    max_output_chars: usize,
}

impl LocateAgent {
    pub fn new(llm: Arc<LlmClient>, language: &str, max_output_chars: usize) -> Self {
        Self {
            llm,
            language: language.to_string(),
            max_output_chars,
        }
    }

    fn build_user_prompt(&self, input: &LocateInput) -> String {
        let records: Vec<String> = input
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| format_record(i + 1, record, self.max_output_chars))
            .collect();
        format!(
            "Notebook: {name}\nRecord count: {count}\n\n{records}\n\n{language}",
            name = input.notebook_name,
            count = input.records.len(),
            records = records.join("\n---\n"),
            language = language_line(&self.language),
        )
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

fn format_record(n: usize, record: &Record, max_output_chars: usize) -> String {
    format!(
        "### Record {n} [{kind}]\n**Title**: {title}\n**User question**: {query}\n**Output**:\n{output}",
        kind = record.kind_label().to_uppercase(),
        title = record.title,
        query = record.user_query,
        output = truncate_chars(&record.output, max_output_chars),
    )
}

/// Accepts a bare list or an object wrapping one under a known key.
fn parse_points(value: serde_json::Value) -> PathwiseResult<Vec<KnowledgePoint>> {
    let list = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut map) => LIST_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(serde_json::Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| {
                PathwiseError::AgentOutput(format!(
                    "expected a list of knowledge points under one of {LIST_KEYS:?}"
                ))
            })?,
        other => {
            return Err(PathwiseError::AgentOutput(format!(
                "expected a list of knowledge points, got {other}"
            )))
        }
    };

    list.into_iter()
        .map(|item| {
            let mut point: KnowledgePoint = serde_json::from_value(item).map_err(|e| {
                PathwiseError::AgentOutput(format!("malformed knowledge point: {e}"))
            })?;
            point.title = point.title.trim().to_string();
            point.summary = point.summary.trim().to_string();
            point.difficulty = point.difficulty.trim().to_string();
            Ok(point)
        })
        .collect()
}

#[async_trait]
impl Agent for LocateAgent {
    type Input = LocateInput;
    type Output = Vec<KnowledgePoint>;

    fn kind(&self) -> AgentKind {
        AgentKind::Locate
    }

    async fn generate(&self, input: &LocateInput) -> PathwiseResult<Vec<KnowledgePoint>> {
        if input.records.is_empty() {
            return Err(PathwiseError::InvalidRequest(
                "no records to build a plan from".into(),
            ));
        }
        let prompt = with_repair(self.build_user_prompt(input), input.repair_hint.as_deref());
        debug!(
            records = input.records.len(),
            notebook_id = %input.notebook_id,
            "Locating knowledge points"
        );

        let raw = self.llm.complete(LOCATE_PROMPT, &prompt, true).await?;
        let value = extract_json(&raw).ok_or_else(|| {
            PathwiseError::AgentOutput("planner output contained no JSON".into())
        })?;
        let points = parse_points(value)?;
        info!(points = points.len(), "Knowledge points located");
        Ok(points)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("short", 10), "short");
        let cut = truncate_chars("héllo wörld", 4);
        assert_eq!(cut, format!("héll{TRUNCATION_MARKER}"));
    }

    #[test]
    fn test_format_record() {
        let record =
            Record::new("r1", "Attention", "Why scale?", "Because variance.").with_kind("solve");
        let text = format_record(1, &record, 100);
        assert!(text.starts_with("### Record 1 [SOLVE]\n**Title**: Attention"));
        assert!(text.contains("**User question**: Why scale?"));
    }

    #[test]
    fn test_parse_points_shapes() {
        let list = serde_json::json!([{"knowledge_title": " A ", "knowledge_summary": "s"}]);
        let points = parse_points(list).unwrap();
        assert_eq!(points[0].title, "A");

        let wrapped = serde_json::json!({"items": [{"title": "B", "summary": "s", "difficulty": "d"}]});
        let points = parse_points(wrapped).unwrap();
        assert_eq!(points[0].title, "B");
        assert_eq!(points[0].difficulty, "d");

        assert!(matches!(
            parse_points(serde_json::json!({"other": []})).unwrap_err(),
            PathwiseError::AgentOutput(_)
        ));
        assert!(matches!(
            parse_points(serde_json::json!("text")).unwrap_err(),
            PathwiseError::AgentOutput(_)
        ));
    }
}
