//! JSON Lines Record Sink Adapter
//!
//! Appends each completed record to a file as one JSON object per line:
//!
//! ```text
//! {"session_id":"…","form_id":"…","completed_at":"…","values":{"HoursSlept":7,"Mood":"Fine"}}
//! ```
//!
//! The sink keeps the set of session ids already in the file, read once on
//! first use, so storing a new session is a plain append. Replacing or
//! removing a record rewrites the file without that session's line. Lines
//! that cannot be parsed are kept as they are.

use async_trait::async_trait;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::foundation::SessionId;
use crate::domain::interview::CompletedRecord;
use crate::ports::{RecordSink, RecordSinkError};

/// Record sink writing to a JSON Lines file.
#[derive(Debug, Clone)]
pub struct JsonlRecordSink {
    path: PathBuf,
    /// Session ids present in the file; `None` until first read.
    /// The lock also serializes file access between concurrent sessions.
    index: Arc<Mutex<Option<HashSet<SessionId>>>>,
}

impl JsonlRecordSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            index: Arc::new(Mutex::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every parseable record in file order.
    pub async fn read_all(&self) -> Result<Vec<CompletedRecord>, RecordSinkError> {
        let _guard = self.index.lock().await;
        Ok(self
            .read_lines()
            .await?
            .iter()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }

    async fn read_lines(&self) -> Result<Vec<String>, RecordSinkError> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text
                .lines()
                .filter(|l| !l.trim().is_empty())
                .map(str::to_string)
                .collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(RecordSinkError::IoError(e.to_string())),
        }
    }

    async fn known_ids<'a>(
        &self,
        index: &'a mut Option<HashSet<SessionId>>,
    ) -> Result<&'a mut HashSet<SessionId>, RecordSinkError> {
        if index.is_none() {
            let ids = self.read_lines().await?.iter().filter_map(|l| session_of(l)).collect();
            *index = Some(ids);
        }
        Ok(index.get_or_insert_with(HashSet::new))
    }

    async fn rewrite(&self, lines: &[String]) -> Result<(), RecordSinkError> {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        fs::write(&self.path, text)
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))
    }

    async fn ensure_parent(&self) -> Result<(), RecordSinkError> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .await
                .map_err(|e| RecordSinkError::IoError(e.to_string())),
            _ => Ok(()),
        }
    }
}

fn session_of(line: &str) -> Option<SessionId> {
    let value: serde_json::Value = serde_json::from_str(line).ok()?;
    value.get("session_id")?.as_str()?.parse().ok()
}

/// True if `line` is a record belonging to `session_id`.
fn belongs_to(line: &str, session_id: SessionId) -> bool {
    session_of(line) == Some(session_id)
}

#[async_trait]
impl RecordSink for JsonlRecordSink {
    async fn store(&self, record: &CompletedRecord) -> Result<(), RecordSinkError> {
        let line = serde_json::to_string(record)
            .map_err(|e| RecordSinkError::SerializationFailed(e.to_string()))?;

        let mut index = self.index.lock().await;
        self.ensure_parent().await?;

        let known = self.known_ids(&mut index).await?;
        if known.contains(&record.session_id) {
            let mut kept: Vec<String> = self
                .read_lines()
                .await?
                .into_iter()
                .filter(|l| !belongs_to(l, record.session_id))
                .collect();
            kept.push(line);
            return self.rewrite(&kept).await;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))?;
        file.write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| RecordSinkError::IoError(e.to_string()))?;
        known.insert(record.session_id);
        Ok(())
    }

    async fn remove(&self, session_id: SessionId) -> Result<bool, RecordSinkError> {
        let mut index = self.index.lock().await;

        let known = self.known_ids(&mut index).await?;
        if !known.contains(&session_id) {
            return Ok(false);
        }

        let kept: Vec<String> = self
            .read_lines()
            .await?
            .into_iter()
            .filter(|l| !belongs_to(l, session_id))
            .collect();
        self.rewrite(&kept).await?;
        known.remove(&session_id);
        Ok(true)
    }
}
