//! Session repository port.
//!
//! Defines the contract for persisting and retrieving interview sessions
//! between turns. A session is saved whole after every change; there is no
//! partial update.

use async_trait::async_trait;

use crate::domain::foundation::{FormId, SessionId};
use crate::domain::interview::Session;

/// Errors that can occur during session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Repository port for Session aggregate persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a session, replacing any previous version with the same id.
    async fn save(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find(&self, id: SessionId) -> Result<Option<Session>, SessionStoreError>;

    /// Delete a session.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the session doesn't exist
    async fn delete(&self, id: SessionId) -> Result<(), SessionStoreError>;

    /// All sessions started from a form, oldest first.
    async fn list_by_form(&self, form_id: FormId) -> Result<Vec<Session>, SessionStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn SessionRepository) {}
    }

    #[test]
    fn not_found_names_the_session() {
        let id = SessionId::new();
        let err = SessionStoreError::NotFound(id);
        assert_eq!(err.to_string(), format!("Session not found: {}", id));
    }
}
