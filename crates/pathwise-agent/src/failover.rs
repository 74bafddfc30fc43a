use crate::backends::{CompletionRequest, LlmBackend};
use async_trait::async_trait;
use pathwise_core::{PathwiseError, PathwiseResult};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configures retry behaviour for failover across LLM backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retries per backend before moving to the next one.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub backoff_base_ms: u64,
    /// Maximum delay in milliseconds (cap for exponential backoff).
    pub backoff_max_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_base_ms: 500,
            backoff_max_ms: 30_000,
        }
    }
}

/// Determines whether an error is transient and worth retrying.
///
/// Only transport errors qualify: rate limits (429), timeouts and server
/// errors (5xx). Client errors such as 400 and every non-HTTP error are
/// returned straight away.
pub fn is_retryable(err: &PathwiseError) -> bool {
    let PathwiseError::Http(msg) = err else {
        return false;
    };
    let lower = msg.to_lowercase();

    if lower.contains(" 400") || lower.starts_with("400") {
        return false;
    }

    lower.contains("429")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("500")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
}

/// Computes the backoff delay for a given attempt using exponential backoff
/// capped at `backoff_max_ms`.
fn compute_backoff(policy: &RetryPolicy, attempt: u32) -> u64 {
    let delay = policy
        .backoff_base_ms
        .saturating_mul(2u64.saturating_pow(attempt));
    delay.min(policy.backoff_max_ms)
}

/// An `LlmBackend` that wraps several backends and performs automatic
/// failover with exponential-backoff retries.
///
/// Backends are tried in order. Within each backend, retryable errors are
/// retried up to `max_retries` times; a non-retryable error or an exhausted
/// budget moves on to the next backend. If every backend fails, the last
/// error is returned.
pub struct FailoverBackend {
    backends: Vec<Box<dyn LlmBackend>>,
    policy: RetryPolicy,
}

impl FailoverBackend {
    pub fn new(backends: Vec<Box<dyn LlmBackend>>, policy: RetryPolicy) -> Self {
        Self { backends, policy }
    }
}

#[async_trait]
impl LlmBackend for FailoverBackend {
    async fn complete(&self, request: &CompletionRequest) -> PathwiseResult<String> {
        let mut last_err: Option<PathwiseError> = None;

        for (backend_idx, backend) in self.backends.iter().enumerate() {
            for attempt in 0..=self.policy.max_retries {
                match backend.complete(request).await {
                    Ok(text) => return Ok(text),
                    Err(e) => {
                        if !is_retryable(&e) {
                            warn!(
                                backend = backend_idx,
                                attempt,
                                error = %e,
                                "Non-retryable error, moving to next backend"
                            );
                            last_err = Some(e);
                            break;
                        }

                        if attempt < self.policy.max_retries {
                            let delay = compute_backoff(&self.policy, attempt);
                            info!(
                                backend = backend_idx,
                                attempt,
                                delay_ms = delay,
                                error = %e,
                                "Retryable error, backing off"
                            );
                            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                        }
                        last_err = Some(e);
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| PathwiseError::Http("no LLM backend configured".into())))
    }
}
