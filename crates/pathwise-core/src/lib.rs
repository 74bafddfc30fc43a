//! Core types and error definitions for the Pathwise guided-learning engine.
//!
//! This crate provides the foundational types shared across all Pathwise crates:
//! the unified error enum, the input record, the knowledge point and the
//! knowledge-scoped chat message.
//!
//! # Main types
//!
//! - [`PathwiseError`]: Unified error enum for all Pathwise subsystems.
//! - [`PathwiseResult`]: Convenience alias for `Result<T, PathwiseError>`.
//! - [`SessionStatus`]: Lifecycle state of a guided-learning session.
//! - [`Record`]: A normalized interaction record fed into planning.
//! - [`KnowledgePoint`]: One unit of the ordered learning plan.
//! - [`ChatMessage`]: A message tagged with the knowledge point it belongs to.

/// Chat roles and knowledge-scoped messages.
pub mod message;
/// Input records and knowledge points.
pub mod record;

pub use message::{ChatMessage, Role};
pub use record::{KnowledgePoint, Record};

use serde::{Deserialize, Serialize};
use std::fmt;

// --- Error types ---

/// Top-level error type for the Pathwise engine.
///
/// The first four variants form the orchestrator's public taxonomy; the rest
/// are ambient failures raised by collaborators.
#[derive(Debug, thiserror::Error)]
pub enum PathwiseError {
    /// No session document exists for the given id.
    #[error("Session not found: {0}")]
    NotFound(String),

    /// The requested operation is illegal for the session's current status.
    #[error("Invalid state: session is {current}, operation requires {}", join_statuses(.expected))]
    InvalidState {
        /// Status the session was in when the operation was attempted.
        current: SessionStatus,
        /// Statuses under which the operation is legal.
        expected: Vec<SessionStatus>,
    },

    /// An agent produced output that failed validation after all retries.
    #[error("Agent output error: {0}")]
    AgentOutput(String),

    /// A persistence failure (write, rename, corrupt document).
    #[error("Storage error: {0}")]
    Storage(String),

    /// The caller supplied an unusable argument (blank message, bad id).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An error from an outbound HTTP request (e.g. LLM API call).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`PathwiseError`].
pub type PathwiseResult<T> = Result<T, PathwiseError>;

fn join_statuses(statuses: &[SessionStatus]) -> String {
    statuses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

// --- Session status ---

/// Lifecycle state of a guided-learning session.
///
/// Transitions are monotonic: `Initialized → Learning → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Plan generated, learning not started.
    Initialized,
    /// Walking through knowledge points.
    Learning,
    /// Summary produced. Terminal.
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Initialized => write!(f, "initialized"),
            SessionStatus::Learning => write!(f, "learning"),
            SessionStatus::Completed => write!(f, "completed"),
        }
    }
}
