use serde::{Deserialize, Serialize};

/// A normalized interaction record (a note, a solved question, a research log).
///
/// `output` may already have been truncated by whoever produced the record;
/// this type does not enforce any length policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Unique identifier within the record source.
    #[serde(default)]
    pub id: String,
    /// Free-form category tag (`solve`, `question`, `research`, ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub user_query: String,
    #[serde(default)]
    pub output: String,
}

impl Record {
    /// Creates a record with no category tag.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        user_query: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: None,
            title: title.into(),
            user_query: user_query.into(),
            output: output.into(),
        }
    }

    /// Sets the category tag.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// The category tag, or `"unknown"` when absent.
    pub fn kind_label(&self) -> &str {
        self.kind.as_deref().unwrap_or("unknown")
    }
}

/// One self-contained learnable unit of the plan.
///
/// Serialized with the `knowledge_*` field names the planning agent speaks;
/// the short names are accepted on input as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgePoint {
    #[serde(rename = "knowledge_title", alias = "title", default)]
    pub title: String,
    #[serde(rename = "knowledge_summary", alias = "summary", default)]
    pub summary: String,
    /// Opaque difficulty label; never interpreted by the engine.
    #[serde(rename = "user_difficulty", alias = "difficulty", default)]
    pub difficulty: String,
}

impl KnowledgePoint {
    pub fn new(
        title: impl Into<String>,
        summary: impl Into<String>,
        difficulty: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            difficulty: difficulty.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_missing_fields_default_to_empty() {
        let record: Record = serde_json::from_str(r#"{"id": "r1", "title": "Attention"}"#).unwrap();
        assert_eq!(record.id, "r1");
        assert_eq!(record.title, "Attention");
        assert!(record.user_query.is_empty());
        assert!(record.output.is_empty());
        assert_eq!(record.kind_label(), "unknown");
    }

    #[test]
    fn test_record_type_key() {
        let record = Record::new("r2", "t", "q", "o").with_kind("solve");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "solve");
        let parsed: Record = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.kind.as_deref(), Some("solve"));
    }

    #[test]
    fn test_knowledge_point_wire_names() {
        let kp = KnowledgePoint::new("Self-Attention", "QK^T / sqrt(d)", "scaling");
        let json = serde_json::to_value(&kp).unwrap();
        assert_eq!(json["knowledge_title"], "Self-Attention");
        assert_eq!(json["knowledge_summary"], "QK^T / sqrt(d)");
        assert_eq!(json["user_difficulty"], "scaling");
    }

    #[test]
    fn test_knowledge_point_accepts_short_aliases() {
        let kp: KnowledgePoint =
            serde_json::from_str(r#"{"title": "RoPE", "summary": "rotary", "difficulty": "hard"}"#)
                .unwrap();
        assert_eq!(kp, KnowledgePoint::new("RoPE", "rotary", "hard"));
    }
}
