//! File-based Session Repository Adapter
//!
//! Stores each session as one YAML file, `<data_dir>/<session_id>.yaml`.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{FormId, SessionId};
use crate::domain::interview::Session;
use crate::ports::{SessionRepository, SessionStoreError};

/// File-based storage for interview sessions
#[derive(Debug, Clone)]
pub struct FileSessionRepository {
    base_path: PathBuf,
}

impl FileSessionRepository {
    /// Create a new repository rooted at `base_path`
    ///
    /// The directory is created on first save.
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_path(&self, id: SessionId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    async fn read_session(path: &Path) -> Result<Option<Session>, SessionStoreError> {
        let yaml = match fs::read_to_string(path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };

        serde_yaml::from_str(&yaml)
            .map(Some)
            .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
    }
}

#[async_trait]
impl SessionRepository for FileSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        let yaml = serde_yaml::to_string(session)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        // Readers only ever see a fully written file.
        let path = self.session_path(session.id());
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }

    async fn find(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        Self::read_session(&self.session_path(id)).await
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError> {
        match fs::remove_file(self.session_path(id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SessionStoreError::NotFound(id)),
            Err(e) => Err(SessionStoreError::IoError(e.to_string())),
        }
    }

    async fn list_by_form(&self, form_id: FormId) -> Result<Vec<Session>, SessionStoreError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(SessionStoreError::IoError(e.to_string())),
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("yaml") {
                continue;
            }
            if let Some(session) = Self::read_session(&path).await? {
                if session.form_id() == form_id {
                    sessions.push(session);
                }
            }
        }

        sessions.sort_by_key(|s| s.created_at());
        Ok(sessions)
    }
}
