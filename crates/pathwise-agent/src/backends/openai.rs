use super::{CompletionRequest, LlmBackend};
use crate::config::{LlmProvider, ModelConfig};
use async_trait::async_trait;
use pathwise_core::{PathwiseError, PathwiseResult};
use tracing::{debug, warn};

/// OpenAI-compatible chat-completions backend.
///
/// Works with OpenAI, OpenRouter, Groq, Ollama, and any other provider
/// that implements the OpenAI chat completions API.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "messages": [
                {"role": "system", "content": request.system_prompt},
                {"role": "user", "content": request.user_prompt},
            ],
        });
        if request.json_mode {
            body["response_format"] = serde_json::json!({"type": "json_object"});
        }
        body
    }

    fn add_provider_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = request
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json");

        // OpenRouter requires extra headers
        if matches!(self.config.provider, LlmProvider::OpenRouter) {
            request
                .header("HTTP-Referer", "http://localhost")
                .header("X-Title", "Pathwise")
        } else {
            request
        }
    }

    /// Some models reject `max_tokens` or `response_format` with a 400 that
    /// names the offending field. Rewrites the body so the request can be
    /// sent once more; returns `false` when there is nothing left to adjust.
    fn adjust_for_rejection(body: &mut serde_json::Value, error_text: &str) -> bool {
        let Some(obj) = body.as_object_mut() else {
            return false;
        };
        if error_text.contains("max_completion_tokens") {
            if let Some(max_tokens) = obj.remove("max_tokens") {
                obj.insert("max_completion_tokens".to_string(), max_tokens);
                return true;
            }
        }
        if error_text.contains("response_format") && obj.remove("response_format").is_some() {
            return true;
        }
        false
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn complete(&self, request: &CompletionRequest) -> PathwiseResult<String> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());
        let mut body = self.build_body(request);

        // At most one rewrite per adjustable field.
        for _ in 0..3 {
            let resp = self
                .add_provider_headers(self.http.post(&url))
                .json(&body)
                .send()
                .await
                .map_err(|e| PathwiseError::Http(e.to_string()))?;

            let status = resp.status();
            let text = resp
                .text()
                .await
                .map_err(|e| PathwiseError::Http(e.to_string()))?;

            if status.is_success() {
                let parsed: serde_json::Value = serde_json::from_str(&text)
                    .map_err(|e| PathwiseError::Http(format!("invalid response body: {e}")))?;
                return parse_openai_response(&parsed);
            }

            if status == reqwest::StatusCode::BAD_REQUEST
                && Self::adjust_for_rejection(&mut body, &text)
            {
                warn!(model = %self.config.model_id, "Provider rejected request field, retrying");
                continue;
            }

            return Err(PathwiseError::Http(format!(
                "OpenAI API error {status}: {text}"
            )));
        }

        Err(PathwiseError::Http(
            "OpenAI API kept rejecting the request".to_string(),
        ))
    }
}

/// Extracts `choices[0].message.content`.
pub fn parse_openai_response(body: &serde_json::Value) -> PathwiseResult<String> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            PathwiseError::AgentOutput(format!("unexpected completion response shape: {body}"))
        })?;
    debug!(chars = content.len(), "Completion received");
    Ok(content.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_openai_response() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}]
        });
        assert_eq!(parse_openai_response(&body).unwrap(), "hello");
    }

    #[test]
    fn test_parse_openai_response_missing_content() {
        let body = serde_json::json!({"choices": []});
        assert!(matches!(
            parse_openai_response(&body).unwrap_err(),
            PathwiseError::AgentOutput(_)
        ));
    }

    #[test]
    fn test_adjust_moves_max_tokens() {
        let mut body = serde_json::json!({"max_tokens": 100, "model": "o1"});
        let changed = OpenAiBackend::adjust_for_rejection(
            &mut body,
            "Unsupported parameter: 'max_tokens'. Use 'max_completion_tokens' instead.",
        );
        assert!(changed);
        assert_eq!(body["max_completion_tokens"], 100);
        assert!(body.get("max_tokens").is_none());

        // Nothing left to rewrite the second time around.
        assert!(!OpenAiBackend::adjust_for_rejection(
            &mut body,
            "Use 'max_completion_tokens' instead."
        ));
    }

    #[test]
    fn test_adjust_drops_response_format() {
        let mut body = serde_json::json!({"response_format": {"type": "json_object"}});
        assert!(OpenAiBackend::adjust_for_rejection(
            &mut body,
            "'response_format' of type 'json_object' is not supported with this model."
        ));
        assert!(body.get("response_format").is_none());
    }
}
