//! Interview session aggregate.
//!
//! A session owns one conversation against one form's schema. It moves
//! `Collecting -> Complete` exactly once, and a complete session accepts no
//! more turns. The extraction result is attached at most once.

use serde::{Deserialize, Serialize};

use super::elicitation::ElicitationOutcome;
use super::result::{CompletedRecord, ExtractionResult};
use super::status::SessionStatus;
use super::turn::{Role, Turn};
use crate::domain::form::{Form, Schema};
use crate::domain::foundation::{
    DomainError, ErrorCode, FormId, SessionId, StateMachine, Timestamp,
};

/// Interview session aggregate.
///
/// # Invariants
///
/// - `conversation` is append-only
/// - once `status` is `Complete` it never changes again
/// - `result` is only ever set on a complete session, and only once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    form_id: FormId,
    /// Copied from the form at start, so later form changes never leak in.
    schema: Schema,
    conversation: Vec<Turn>,
    status: SessionStatus,
    result: Option<ExtractionResult>,
    created_at: Timestamp,
    updated_at: Timestamp,
    completed_at: Option<Timestamp>,
}

impl Session {
    /// Starts a new, empty session for `form`.
    pub fn start(form: &Form) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            form_id: form.id(),
            schema: form.schema().clone(),
            conversation: Vec::new(),
            status: SessionStatus::Collecting,
            result: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn form_id(&self) -> FormId {
        self.form_id
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn conversation(&self) -> &[Turn] {
        &self.conversation
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn result(&self) -> Option<&ExtractionResult> {
        self.result.as_ref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// The last assistant message, if any.
    pub fn last_assistant_message(&self) -> Option<&str> {
        self.conversation
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.as_str())
    }

    pub fn accepts_user_input(&self) -> bool {
        self.status.accepts_user_input()
    }

    /// True when the session is complete but has no result yet.
    pub fn needs_extraction(&self) -> bool {
        self.status == SessionStatus::Complete && self.result.is_none()
    }

    /// Conversation as it would look with `user_text` appended.
    ///
    /// Used to ask the elicitation engine for the next turn before anything
    /// is committed to the session.
    pub fn pending_conversation(&self, user_text: &str) -> Vec<Turn> {
        let mut turns = self.conversation.clone();
        turns.push(Turn::user(user_text));
        turns
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records the opening assistant message of a fresh session.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the conversation already has turns
    pub fn record_opening(&mut self, outcome: &ElicitationOutcome) -> Result<(), DomainError> {
        if !self.conversation.is_empty() {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Opening message can only be recorded on an empty conversation",
            ));
        }
        self.conversation.push(Turn::assistant(&outcome.message));
        self.apply_outcome(outcome)
    }

    /// Records a user message and the assistant reply to it.
    ///
    /// Completes the session when the outcome says so.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if `user_text` is blank
    /// - `SessionComplete` if the session no longer accepts input
    pub fn record_exchange(
        &mut self,
        user_text: &str,
        outcome: &ElicitationOutcome,
    ) -> Result<(), DomainError> {
        self.ensure_collecting()?;
        if user_text.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Message cannot be empty",
            ));
        }

        self.conversation.push(Turn::user(user_text));
        self.conversation.push(Turn::assistant(&outcome.message));
        self.apply_outcome(outcome)
    }

    /// Attaches the extraction result.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if the session is still collecting
    /// - `ResultAlreadyAttached` if a result is already present
    pub fn attach_result(&mut self, result: ExtractionResult) -> Result<(), DomainError> {
        if self.status != SessionStatus::Complete {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Cannot attach a result to a session that is still collecting",
            ));
        }
        if self.result.is_some() {
            return Err(DomainError::new(
                ErrorCode::ResultAlreadyAttached,
                "Session already has an extraction result",
            ));
        }
        self.result = Some(result);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Builds the record handed to a `RecordSink`, once a result exists.
    pub fn completed_record(&self) -> Option<CompletedRecord> {
        let values = self.result.clone()?;
        Some(CompletedRecord {
            session_id: self.id,
            form_id: self.form_id,
            completed_at: self.completed_at.unwrap_or(self.updated_at),
            values,
        })
    }

    fn ensure_collecting(&self) -> Result<(), DomainError> {
        if self.accepts_user_input() {
            Ok(())
        } else {
            Err(DomainError::new(
                ErrorCode::SessionComplete,
                "Session is complete and accepts no further messages",
            )
            .with_detail("session_id", self.id.to_string()))
        }
    }

    fn apply_outcome(&mut self, outcome: &ElicitationOutcome) -> Result<(), DomainError> {
        let now = Timestamp::now();
        if outcome.complete {
            self.status = self.status.transition_to(SessionStatus::Complete)?;
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }
}
