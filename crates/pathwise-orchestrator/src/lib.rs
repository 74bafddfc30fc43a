//! Guided-learning session engine.
//!
//! Turns a learner's interaction records into an ordered plan of knowledge
//! points, then walks the learner through them one page at a time with a
//! chat scoped to the current point and a summary at the end.
//!
//! # Main types
//!
//! - [`Orchestrator`]: Drives sessions through `initialized → learning → completed`.
//! - [`GuideConfig`]: Language, history ceiling and retry budget.
//! - [`SessionLocks`]: Per-session exclusive sections for concurrent callers.

/// Run configuration.
pub mod config;
/// The session state machine and its operations.
pub mod engine;
/// Per-session async locks.
pub mod locks;
/// Request and response types of the operation surface.
pub mod types;

pub use config::GuideConfig;
pub use engine::Orchestrator;
pub use locks::{SessionGuard, SessionLocks};
pub use types::{
    ChatResponse, CreateSessionRequest, CreateSessionResponse, FixHtmlResponse, NextResponse,
    StartResponse,
};
