use pathwise_agent::ModelConfig;
use pathwise_orchestrator::GuideConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct PathwiseConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "ModelConfig::demo")]
    pub model: ModelConfig,
    #[serde(default)]
    pub guide: GuideConfig,
}

impl Default for PathwiseConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            model: ModelConfig::demo(),
            guide: GuideConfig::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl PathwiseConfig {
    /// Reads `path`; a missing file yields the offline defaults.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let text = match tokio::fs::read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file, using demo provider");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        };
        let mut config: Self = toml::from_str(&text)
            .map_err(|e| anyhow::anyhow!("Invalid config file '{}': {e}", path.display()))?;
        config.model.resolve_api_key();
        Ok(config)
    }

    pub fn sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }
}
