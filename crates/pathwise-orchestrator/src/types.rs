use pathwise_core::{KnowledgePoint, Record, SessionStatus};
use serde::{Deserialize, Serialize};

/// Input to [`crate::Orchestrator::create_session`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub records: Vec<Record>,
    #[serde(default)]
    pub notebook_id: Option<String>,
    #[serde(default)]
    pub notebook_name: Option<String>,
}

impl CreateSessionRequest {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            notebook_id: None,
            notebook_name: None,
        }
    }

    pub fn with_notebook(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.notebook_id = Some(id.into());
        self.notebook_name = Some(name.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
    pub knowledge_points: Vec<KnowledgePoint>,
    pub total_points: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub current_index: usize,
    pub current_knowledge: KnowledgePoint,
    pub html: String,
    pub progress: u32,
    pub total_points: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    pub knowledge_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixHtmlResponse {
    pub html: String,
}

/// Outcome of [`crate::Orchestrator::next`], tagged by the resulting status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NextResponse {
    /// Moved on to another knowledge point.
    Learning {
        current_index: usize,
        current_knowledge: KnowledgePoint,
        html: String,
        progress: u32,
        total_points: usize,
        remaining_points: usize,
        message: String,
    },
    /// The last point was finished and the summary written.
    Completed { summary: String, progress: u32 },
}
