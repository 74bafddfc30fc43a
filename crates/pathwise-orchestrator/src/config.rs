use serde::{Deserialize, Serialize};

/// Tuning knobs for a guided-learning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuideConfig {
    /// Language code passed to every agent prompt.
    #[serde(default = "default_language")]
    pub language: String,
    /// Ceiling on the scoped history handed to the chat agent.
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
    /// Extra attempts after an agent's first output fails validation.
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: u32,
    /// Record outputs longer than this are cut before planning.
    #[serde(default = "default_max_record_output_chars")]
    pub max_record_output_chars: usize,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_max_history_messages() -> usize {
    10
}

fn default_max_repair_attempts() -> u32 {
    2
}

fn default_max_record_output_chars() -> usize {
    2000
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            max_history_messages: default_max_history_messages(),
            max_repair_attempts: default_max_repair_attempts(),
            max_record_output_chars: default_max_record_output_chars(),
        }
    }
}
