//! In-Memory Record Sink Adapter

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::SessionId;
use crate::domain::interview::CompletedRecord;
use crate::ports::{RecordSink, RecordSinkError};

/// Keeps completed records in memory, one per session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecordSink {
    records: Arc<RwLock<HashMap<SessionId, CompletedRecord>>>,
}

impl InMemoryRecordSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The record stored for a session, if any.
    pub async fn get(&self, session_id: SessionId) -> Option<CompletedRecord> {
        self.records.read().await.get(&session_id).cloned()
    }

    /// Number of stored records.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl RecordSink for InMemoryRecordSink {
    async fn store(&self, record: &CompletedRecord) -> Result<(), RecordSinkError> {
        self.records
            .write()
            .await
            .insert(record.session_id, record.clone());
        Ok(())
    }

    async fn remove(&self, session_id: SessionId) -> Result<bool, RecordSinkError> {
        Ok(self.records.write().await.remove(&session_id).is_some())
    }
}
