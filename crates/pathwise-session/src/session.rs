use chrono::{DateTime, Utc};
use pathwise_core::{
    ChatMessage, KnowledgePoint, PathwiseError, PathwiseResult, Role, SessionStatus,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The full state of one guided-learning run.
///
/// Fields are public for serialization and inspection, but every mutation the
/// engine performs goes through the transition methods below, which keep the
/// status/index/history invariants intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub notebook_id: String,
    pub notebook_name: String,
    pub created_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub knowledge_points: Vec<KnowledgePoint>,
    /// Unset until `start`; afterwards always a valid index.
    #[serde(default)]
    pub current_index: Option<usize>,
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub current_html: Option<String>,
    #[serde(default)]
    pub summary_markdown: Option<String>,
}

impl Session {
    /// Creates an `initialized` session with a fresh id.
    pub fn new(
        notebook_id: impl Into<String>,
        notebook_name: impl Into<String>,
        knowledge_points: Vec<KnowledgePoint>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            notebook_id: notebook_id.into(),
            notebook_name: notebook_name.into(),
            created_at: Utc::now(),
            status: SessionStatus::Initialized,
            knowledge_points,
            current_index: None,
            chat_history: Vec::new(),
            current_html: None,
            summary_markdown: None,
        }
    }

    pub fn total_points(&self) -> usize {
        self.knowledge_points.len()
    }

    /// Fails with `InvalidState` unless the status is one of `expected`.
    pub fn require_status(&self, expected: &[SessionStatus]) -> PathwiseResult<()> {
        if expected.contains(&self.status) {
            Ok(())
        } else {
            Err(PathwiseError::InvalidState {
                current: self.status,
                expected: expected.to_vec(),
            })
        }
    }

    pub fn current_knowledge(&self) -> Option<&KnowledgePoint> {
        self.current_index.and_then(|i| self.knowledge_points.get(i))
    }

    /// Index the next `advance` would move to, if any point is left.
    pub fn next_index(&self) -> Option<usize> {
        let next = self.current_index? + 1;
        (next < self.knowledge_points.len()).then_some(next)
    }

    /// Integer percentage of the plan already behind the learner.
    pub fn progress(&self) -> u32 {
        if self.status == SessionStatus::Completed {
            return 100;
        }
        match (self.current_index, self.knowledge_points.len()) {
            (Some(index), total) if total > 0 => (index * 100 / total) as u32,
            _ => 0,
        }
    }

    pub fn remaining_points(&self) -> usize {
        match self.current_index {
            Some(index) => self.knowledge_points.len().saturating_sub(index + 1),
            None => self.knowledge_points.len(),
        }
    }

    /// The most recent `limit` messages tagged with `index`, oldest first.
    pub fn scoped_history(&self, index: usize, limit: usize) -> Vec<ChatMessage> {
        let scoped: Vec<&ChatMessage> = self
            .chat_history
            .iter()
            .filter(|m| m.knowledge_index == index)
            .collect();
        let skip = scoped.len().saturating_sub(limit);
        scoped.into_iter().skip(skip).cloned().collect()
    }

    /// `initialized → learning`, showing the first knowledge point.
    pub fn begin(&mut self, html: String) -> PathwiseResult<()> {
        self.require_status(&[SessionStatus::Initialized])?;
        if self.knowledge_points.is_empty() {
            return Err(PathwiseError::InvalidRequest(
                "session has no knowledge points".into(),
            ));
        }
        self.status = SessionStatus::Learning;
        self.current_index = Some(0);
        self.current_html = Some(html);
        Ok(())
    }

    /// Moves to the next knowledge point and installs its view.
    pub fn advance(&mut self, html: String) -> PathwiseResult<usize> {
        self.require_status(&[SessionStatus::Learning])?;
        let next = self.next_index().ok_or_else(|| {
            PathwiseError::InvalidRequest("already at the last knowledge point".into())
        })?;
        self.current_index = Some(next);
        self.current_html = Some(html);
        Ok(next)
    }

    /// Overwrites the current view without moving.
    pub fn replace_html(&mut self, html: String) -> PathwiseResult<()> {
        self.require_status(&[SessionStatus::Learning])?;
        self.current_html = Some(html);
        Ok(())
    }

    /// `learning → completed`. Only legal on the last knowledge point.
    ///
    /// `current_html` is left in place so the last view stays retrievable.
    pub fn complete(&mut self, summary: String) -> PathwiseResult<()> {
        self.require_status(&[SessionStatus::Learning])?;
        if self.next_index().is_some() {
            return Err(PathwiseError::InvalidRequest(
                "knowledge points remain; cannot complete yet".into(),
            ));
        }
        if summary.trim().is_empty() {
            return Err(PathwiseError::InvalidRequest("summary is empty".into()));
        }
        self.status = SessionStatus::Completed;
        self.summary_markdown = Some(summary);
        Ok(())
    }

    /// Appends a message tagged with the current knowledge point.
    ///
    /// The timestamp is clamped so history order always equals time order.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> PathwiseResult<()> {
        let index = self.current_index.ok_or(PathwiseError::InvalidState {
            current: self.status,
            expected: vec![SessionStatus::Learning, SessionStatus::Completed],
        })?;
        let mut message = ChatMessage::new(role, content, index);
        if let Some(last) = self.chat_history.last() {
            if message.timestamp < last.timestamp {
                message.timestamp = last.timestamp;
            }
        }
        self.chat_history.push(message);
        Ok(())
    }
}
