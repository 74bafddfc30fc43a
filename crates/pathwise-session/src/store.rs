use crate::session::Session;
use async_trait::async_trait;
use pathwise_core::{PathwiseError, PathwiseResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Durable keyed storage for session documents.
///
/// Implementations never validate session content; that is the
/// orchestrator's job. `save` must be atomic: a concurrent or later reader
/// sees either the previous document or the new one, never a mix.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a brand-new session. Fails if the id is already taken.
    async fn create(&self, session: &Session) -> PathwiseResult<()>;
    /// Fails with `NotFound` when no document exists.
    async fn load(&self, session_id: &str) -> PathwiseResult<Session>;
    async fn save(&self, session: &Session) -> PathwiseResult<()>;
    async fn exists(&self, session_id: &str) -> PathwiseResult<bool>;
    /// Ids of every stored session, sorted.
    async fn list(&self) -> PathwiseResult<Vec<String>>;
}

/// Rejects ids that could escape the store directory or collide with
/// staging files.
pub fn validate_session_id(session_id: &str) -> PathwiseResult<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PathwiseError::InvalidRequest(format!(
            "invalid session id: {session_id:?}"
        )))
    }
}

fn storage_err(context: &str, path: &Path, e: std::io::Error) -> PathwiseError {
    PathwiseError::Storage(format!("{context} {}: {e}", path.display()))
}

// ---------------------------------------------------------------------------
// FileSessionStore
// ---------------------------------------------------------------------------

/// One pretty-printed JSON document per session: `<dir>/session_<id>.json`.
///
/// Writes go to a uniquely named staging file in the same directory, are
/// flushed to disk, then installed with a single rename.
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub async fn new(dir: PathBuf) -> PathwiseResult<Self> {
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| storage_err("failed to create session directory", &dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("session_{session_id}.json"))
    }

    fn staging_path(&self, session_id: &str) -> PathBuf {
        self.dir
            .join(format!(".session_{session_id}.json.{}.tmp", Uuid::new_v4().simple()))
    }

    async fn write_atomic(&self, session: &Session) -> PathwiseResult<()> {
        let path = self.session_path(&session.session_id);
        let staging = self.staging_path(&session.session_id);
        let json = serde_json::to_vec_pretty(session)?;

        if let Err(e) = write_and_sync(&staging, &json).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(storage_err("failed to write staging file", &staging, e));
        }

        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(storage_err("failed to install session document", &path, e));
        }

        debug!(session_id = %session.session_id, bytes = json.len(), "Session document saved");
        Ok(())
    }
}

async fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn create(&self, session: &Session) -> PathwiseResult<()> {
        validate_session_id(&session.session_id)?;
        if self.exists(&session.session_id).await? {
            return Err(PathwiseError::Storage(format!(
                "session {} already exists",
                session.session_id
            )));
        }
        self.write_atomic(session).await
    }

    async fn load(&self, session_id: &str) -> PathwiseResult<Session> {
        // No document can exist under a malformed id.
        if validate_session_id(session_id).is_err() {
            return Err(PathwiseError::NotFound(session_id.to_string()));
        }
        let path = self.session_path(session_id);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PathwiseError::NotFound(session_id.to_string()));
            }
            Err(e) => return Err(storage_err("failed to read session document", &path, e)),
        };
        serde_json::from_str(&data).map_err(|e| {
            warn!(session_id = %session_id, error = %e, "Corrupt session document");
            PathwiseError::Storage(format!("corrupt session document {session_id}: {e}"))
        })
    }

    async fn save(&self, session: &Session) -> PathwiseResult<()> {
        validate_session_id(&session.session_id)?;
        self.write_atomic(session).await
    }

    async fn exists(&self, session_id: &str) -> PathwiseResult<bool> {
        if validate_session_id(session_id).is_err() {
            return Ok(false);
        }
        let path = self.session_path(session_id);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| storage_err("failed to stat session document", &path, e))
    }

    async fn list(&self) -> PathwiseResult<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| storage_err("failed to list sessions in", &self.dir, e))?;
        let mut ids = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| storage_err("failed to list sessions in", &self.dir, e))?
        {
            if let Some(name) = entry.file_name().to_str() {
                if let Some(id) = name
                    .strip_prefix("session_")
                    .and_then(|rest| rest.strip_suffix(".json"))
                {
                    if validate_session_id(id).is_ok() {
                        ids.push(id.to_string());
                    }
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

// ---------------------------------------------------------------------------
// MemorySessionStore
// ---------------------------------------------------------------------------

/// Process-local store. Documents are cloned in and out, so callers still get
/// the exclusive-copy semantics of the file store.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &Session) -> PathwiseResult<()> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session.session_id) {
            return Err(PathwiseError::Storage(format!(
                "session {} already exists",
                session.session_id
            )));
        }
        sessions.insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> PathwiseResult<Session> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| PathwiseError::NotFound(session_id.to_string()))
    }

    async fn save(&self, session: &Session) -> PathwiseResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn exists(&self, session_id: &str) -> PathwiseResult<bool> {
        Ok(self.sessions.read().await.contains_key(session_id))
    }

    async fn list(&self) -> PathwiseResult<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
