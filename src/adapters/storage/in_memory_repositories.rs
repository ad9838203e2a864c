//! In-Memory Repository Adapters
//!
//! Keep forms and sessions in memory. Used for tests, development, and the
//! `memory` storage backend.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::form::Form;
use crate::domain::foundation::{FormId, SessionId};
use crate::domain::interview::Session;
use crate::ports::{FormRepository, FormStoreError, SessionRepository, SessionStoreError};

/// In-memory storage for registered forms.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFormRepository {
    forms: Arc<RwLock<HashMap<FormId, Form>>>,
}

impl InMemoryFormRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored forms.
    pub async fn count(&self) -> usize {
        self.forms.read().await.len()
    }
}

#[async_trait]
impl FormRepository for InMemoryFormRepository {
    async fn save(&self, form: &Form) -> Result<(), FormStoreError> {
        self.forms.write().await.insert(form.id(), form.clone());
        Ok(())
    }

    async fn find(&self, id: FormId) -> Result<Option<Form>, FormStoreError> {
        Ok(self.forms.read().await.get(&id).cloned())
    }
}

/// In-memory storage for interview sessions.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored sessions (useful for tests)
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }

    /// Number of stored sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id(), session.clone());
        Ok(())
    }

    async fn find(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.sessions.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(SessionStoreError::NotFound(id))
    }

    async fn list_by_form(&self, form_id: FormId) -> Result<Vec<Session>, SessionStoreError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.form_id() == form_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.created_at());
        Ok(sessions)
    }
}
