use crate::config::GuideConfig;
use crate::locks::SessionLocks;
use crate::types::{
    ChatResponse, CreateSessionRequest, CreateSessionResponse, FixHtmlResponse, NextResponse,
    StartResponse,
};
use pathwise_agent::{
    fallback_document, Agent, AgentSet, ChatInput, InteractiveInput, LlmClient, LocateInput,
    ModelConfig, SummaryInput, SESSION_ID_PLACEHOLDER,
};
use pathwise_core::{KnowledgePoint, PathwiseError, PathwiseResult, Role, SessionStatus};
use pathwise_session::{Session, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_NOTEBOOK_ID: &str = "cross_notebook";

/// Inputs that can carry the reason the previous attempt was rejected.
trait RepairHint {
    fn set_repair_hint(&mut self, hint: String);
}

macro_rules! impl_repair_hint {
    ($($ty:ty),*) => {
        $(impl RepairHint for $ty {
            fn set_repair_hint(&mut self, hint: String) {
                self.repair_hint = Some(hint);
            }
        })*
    };
}

impl_repair_hint!(LocateInput, InteractiveInput, ChatInput, SummaryInput);

fn non_blank(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        Err("the answer was empty".to_string())
    } else {
        Ok(())
    }
}

fn valid_plan(points: &[KnowledgePoint]) -> Result<(), String> {
    if points.is_empty() {
        return Err("the plan contained no knowledge points".to_string());
    }
    match points.iter().position(|kp| kp.title.trim().is_empty()) {
        Some(i) => Err(format!("knowledge point {} has an empty title", i + 1)),
        None => Ok(()),
    }
}

fn complete_document(html: &str) -> Result<(), String> {
    if pathwise_agent::extract::is_complete_document(html) {
        Ok(())
    } else {
        Err("the page is not a complete HTML document (missing <html> or </html>)".to_string())
    }
}

/// Index and knowledge point a `learning` session is positioned on.
fn position(session: &Session) -> PathwiseResult<(usize, KnowledgePoint)> {
    match (session.current_index, session.current_knowledge()) {
        (Some(index), Some(kp)) => Ok((index, kp.clone())),
        _ => Err(PathwiseError::Storage(format!(
            "session {} is learning but has no valid current index",
            session.session_id
        ))),
    }
}

/// Drives guided-learning sessions through `initialized → learning → completed`.
///
/// Every mutating operation holds the session's lock for its whole
/// load → validate → generate → mutate → save span, and loads a fresh copy
/// from the store each time; nothing is cached between operations.
pub struct Orchestrator {
    store: Arc<dyn SessionStore>,
    agents: AgentSet,
    config: GuideConfig,
    locks: SessionLocks,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn SessionStore>, agents: AgentSet, config: GuideConfig) -> Self {
        Self {
            store,
            agents,
            config,
            locks: SessionLocks::new(),
        }
    }

    /// Orchestrator whose four agents share one model client built from `model`.
    pub fn with_model(
        store: Arc<dyn SessionStore>,
        model: ModelConfig,
        config: GuideConfig,
    ) -> Self {
        let llm = Arc::new(LlmClient::new(model));
        let agents = AgentSet::llm_backed(llm, &config.language, config.max_record_output_chars);
        Self::new(store, agents, config)
    }

    /// Number of sessions with an operation currently in flight.
    pub fn active_sessions(&self) -> usize {
        self.locks.len()
    }

    /// Runs `agent`, retrying with a repair hint while its output is rejected.
    /// `context` (session or notebook id) only labels the log events.
    ///
    /// Only `AgentOutput` failures and `validate` rejections are retried;
    /// every other error is returned as is.
    async fn generate_validated<A, V>(
        &self,
        context: &str,
        agent: &A,
        mut input: A::Input,
        validate: V,
    ) -> PathwiseResult<A::Output>
    where
        A: Agent + ?Sized,
        A::Input: RepairHint,
        V: Fn(&A::Output) -> Result<(), String>,
    {
        let attempts = self.config.max_repair_attempts.saturating_add(1);
        let mut last_reason = String::new();

        for attempt in 1..=attempts {
            let reason = match agent.generate(&input).await {
                Ok(output) => match validate(&output) {
                    Ok(()) => return Ok(output),
                    Err(reason) => reason,
                },
                Err(PathwiseError::AgentOutput(reason)) => reason,
                Err(e) => return Err(e),
            };
            warn!(
                context = %context,
                agent = %agent.kind(),
                attempt,
                reason = %reason,
                "Agent output rejected"
            );
            input.set_repair_hint(reason.clone());
            last_reason = reason;
        }

        Err(PathwiseError::AgentOutput(format!(
            "{} agent output rejected after {attempts} attempts: {last_reason}",
            agent.kind()
        )))
    }

    /// Renders a view for `input.knowledge`, substituting the fallback page on
    /// any failure, and binds it to `session_id`.
    async fn render_view(&self, session_id: &str, input: InteractiveInput) -> String {
        let knowledge = input.knowledge.clone();
        let agent = self.agents.interactive.as_ref();
        let html = match self
            .generate_validated(session_id, agent, input, |html: &String| {
                complete_document(html)
            })
            .await
        {
            Ok(html) => html,
            Err(e) => {
                warn!(
                    session_id = %session_id,
                    title = %knowledge.title,
                    error = %e,
                    "Interactive agent failed, using fallback page"
                );
                fallback_document(&knowledge)
            }
        };
        html.replace(SESSION_ID_PLACEHOLDER, session_id)
    }

    /// Plans a new session from `request.records`.
    pub async fn create_session(
        &self,
        request: CreateSessionRequest,
    ) -> PathwiseResult<CreateSessionResponse> {
        if request.records.is_empty() {
            return Err(PathwiseError::InvalidRequest(
                "at least one record is required".into(),
            ));
        }
        let notebook_id = request
            .notebook_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NOTEBOOK_ID.to_string());
        let notebook_name = request
            .notebook_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Cross-notebook ({} records)", request.records.len()));

        let input = LocateInput {
            records: request.records,
            notebook_id: notebook_id.clone(),
            notebook_name: notebook_name.clone(),
            repair_hint: None,
        };
        let agent = self.agents.locate.as_ref();
        let points = self
            .generate_validated(&notebook_id, agent, input, |points: &Vec<KnowledgePoint>| {
                valid_plan(points)
            })
            .await?;

        let session = Session::new(notebook_id, notebook_name, points);
        self.store.create(&session).await?;
        info!(
            session_id = %session.session_id,
            points = session.total_points(),
            "Session created"
        );

        Ok(CreateSessionResponse {
            total_points: session.total_points(),
            session_id: session.session_id,
            status: session.status,
            knowledge_points: session.knowledge_points,
        })
    }

    /// Shows the first knowledge point.
    pub async fn start(&self, session_id: &str) -> PathwiseResult<StartResponse> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.store.load(session_id).await?;
        session.require_status(&[SessionStatus::Initialized])?;

        let first = session.knowledge_points.first().cloned().ok_or_else(|| {
            PathwiseError::InvalidRequest("session has no knowledge points".into())
        })?;
        let html = self
            .render_view(session_id, InteractiveInput::fresh(first.clone()))
            .await;

        session.begin(html.clone())?;
        let message = format!("Starting knowledge point 1: {}", first.title);
        session.append_message(Role::System, message.as_str())?;
        self.store.save(&session).await?;
        info!(session_id = %session_id, "Session started");

        Ok(StartResponse {
            current_index: 0,
            current_knowledge: first,
            html,
            progress: session.progress(),
            total_points: session.total_points(),
            message,
        })
    }

    /// Answers a question about the current knowledge point.
    pub async fn chat(&self, session_id: &str, message: &str) -> PathwiseResult<ChatResponse> {
        if message.trim().is_empty() {
            return Err(PathwiseError::InvalidRequest("message is empty".into()));
        }
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.store.load(session_id).await?;
        session.require_status(&[SessionStatus::Learning])?;

        let (index, knowledge) = position(&session)?;
        let input = ChatInput {
            knowledge,
            history: session.scoped_history(index, self.config.max_history_messages),
            question: message.to_string(),
            repair_hint: None,
        };
        let answer = self
            .generate_validated(session_id, self.agents.chat.as_ref(), input, |a: &String| {
                non_blank(a)
            })
            .await?;

        session.append_message(Role::User, message)?;
        session.append_message(Role::Assistant, answer.as_str())?;
        self.store.save(&session).await?;
        info!(session_id = %session_id, knowledge_index = index, "Question answered");

        Ok(ChatResponse {
            answer,
            knowledge_index: index,
        })
    }

    /// Regenerates the current view given a problem description.
    pub async fn fix_html(
        &self,
        session_id: &str,
        bug_description: &str,
    ) -> PathwiseResult<FixHtmlResponse> {
        if bug_description.trim().is_empty() {
            return Err(PathwiseError::InvalidRequest(
                "bug description is empty".into(),
            ));
        }
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.store.load(session_id).await?;
        session.require_status(&[SessionStatus::Learning])?;

        let (index, knowledge) = position(&session)?;
        let input = InteractiveInput {
            knowledge,
            previous_html: session.current_html.clone(),
            bug_description: Some(bug_description.to_string()),
            repair_hint: None,
        };
        let html = self.render_view(session_id, input).await;

        session.replace_html(html.clone())?;
        self.store.save(&session).await?;
        info!(session_id = %session_id, knowledge_index = index, "View regenerated");

        Ok(FixHtmlResponse { html })
    }

    /// Moves to the next knowledge point, or completes the run after the last one.
    pub async fn next(&self, session_id: &str) -> PathwiseResult<NextResponse> {
        let _guard = self.locks.acquire(session_id).await;
        let mut session = self.store.load(session_id).await?;
        session.require_status(&[SessionStatus::Learning])?;

        if let Some(next_index) = session.next_index() {
            let knowledge = session.knowledge_points[next_index].clone();
            let html = self
                .render_view(session_id, InteractiveInput::fresh(knowledge.clone()))
                .await;

            session.advance(html.clone())?;
            let message = format!(
                "Entering knowledge point {}: {}",
                next_index + 1,
                knowledge.title
            );
            session.append_message(Role::System, message.as_str())?;
            self.store.save(&session).await?;
            info!(session_id = %session_id, knowledge_index = next_index, "Advanced");

            return Ok(NextResponse::Learning {
                current_index: next_index,
                current_knowledge: knowledge,
                html,
                progress: session.progress(),
                total_points: session.total_points(),
                remaining_points: session.remaining_points(),
                message,
            });
        }

        let input = SummaryInput {
            notebook_name: session.notebook_name.clone(),
            knowledge_points: session.knowledge_points.clone(),
            chat_history: session.chat_history.clone(),
            repair_hint: None,
        };
        let summary = self
            .generate_validated(session_id, self.agents.summary.as_ref(), input, |s: &String| {
                non_blank(s)
            })
            .await?;

        session.append_message(Role::System, "Completed all knowledge points.")?;
        session.complete(summary.clone())?;
        self.store.save(&session).await?;
        info!(session_id = %session_id, "Session completed");

        Ok(NextResponse::Completed {
            summary,
            progress: session.progress(),
        })
    }

    /// Read-only snapshot of the stored session.
    pub async fn get_session(&self, session_id: &str) -> PathwiseResult<Session> {
        self.store.load(session_id).await
    }

    /// The stored view, or an empty string before `start`.
    pub async fn current_html(&self, session_id: &str) -> PathwiseResult<String> {
        let session = self.store.load(session_id).await?;
        Ok(session.current_html.unwrap_or_default())
    }

    /// Ids of every stored session.
    pub async fn list_sessions(&self) -> PathwiseResult<Vec<String>> {
        self.store.list().await
    }
}
