//! Interviewer - drives interview sessions from start to stored record.
//!
//! Flow per session:
//!
//! ```text
//! start_session ──► elicitation (opening) ──► save
//! submit_message ─► elicitation (next turn) ─► save
//!                      └─ complete? ─► extraction ─► attach result ─► record sink ─► save
//! ```
//!
//! A session is strictly sequential. While a model call for a session is in
//! flight, any other request touching that session fails with
//! `InterviewError::SessionBusy`; it is not queued. Different sessions share
//! nothing and run in parallel.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::form::{FieldSpec, Form, Schema, SchemaError};
use crate::domain::foundation::{DomainError, ErrorCode, FormId, SessionId};
use crate::domain::interview::{
    ElicitationEngine, ElicitationOutcome, ExtractionEngine, ExtractionError, ExtractionResult,
    Session, SessionStatus,
};
use crate::ports::{
    FormRepository, FormStoreError, RecordSink, RecordSinkError, SessionRepository,
    SessionStoreError,
};

/// Errors returned by interviewer operations.
#[derive(Debug, Error)]
pub enum InterviewError {
    /// Input failed validation (blank title, empty message).
    #[error("Validation error: {0}")]
    Validation(String),

    /// The submitted field list is not a valid schema.
    #[error(transparent)]
    InvalidSchema(#[from] SchemaError),

    #[error("Form not found: {0}")]
    FormNotFound(FormId),

    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The session already finished collecting.
    #[error("Session {0} is complete and accepts no further messages")]
    SessionComplete(SessionId),

    /// Another request for this session is still in progress.
    #[error("Session {0} is busy with another request")]
    SessionBusy(SessionId),

    /// Extraction was requested for a session that is not waiting for one.
    #[error("Session {0} has nothing to extract")]
    NothingToExtract(SessionId),

    /// An explicit extraction attempt failed.
    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl InterviewError {
    /// Stable error code for API responses.
    pub fn code(&self) -> ErrorCode {
        match self {
            InterviewError::Validation(_) => ErrorCode::ValidationFailed,
            InterviewError::InvalidSchema(_) => ErrorCode::InvalidSchema,
            InterviewError::FormNotFound(_) => ErrorCode::FormNotFound,
            InterviewError::SessionNotFound(_) => ErrorCode::SessionNotFound,
            InterviewError::SessionComplete(_) => ErrorCode::SessionComplete,
            InterviewError::SessionBusy(_) => ErrorCode::SessionBusy,
            InterviewError::NothingToExtract(_) => ErrorCode::InvalidStateTransition,
            InterviewError::Extraction(ExtractionError::Provider(_)) => ErrorCode::AIProviderError,
            InterviewError::Extraction(ExtractionError::Decode(_)) => ErrorCode::ExtractionFailed,
            InterviewError::Storage(_) => ErrorCode::StorageError,
            InterviewError::Domain(err) => err.code(),
        }
    }
}

impl From<FormStoreError> for InterviewError {
    fn from(err: FormStoreError) -> Self {
        InterviewError::Storage(err.to_string())
    }
}

impl From<SessionStoreError> for InterviewError {
    fn from(err: SessionStoreError) -> Self {
        match err {
            SessionStoreError::NotFound(id) => InterviewError::SessionNotFound(id),
            other => InterviewError::Storage(other.to_string()),
        }
    }
}

impl From<RecordSinkError> for InterviewError {
    fn from(err: RecordSinkError) -> Self {
        InterviewError::Storage(err.to_string())
    }
}

/// What the caller sees after a turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub session_id: SessionId,
    /// The assistant message to display.
    pub message: String,
    pub status: SessionStatus,
    /// Set once the session has been extracted successfully.
    pub result: Option<ExtractionResult>,
    /// Why extraction failed, if it was attempted and failed.
    pub extraction_error: Option<String>,
}

impl TurnOutcome {
    fn new(session: &Session, outcome: &ElicitationOutcome) -> Self {
        Self {
            session_id: session.id(),
            message: outcome.message.clone(),
            status: session.status(),
            result: session.result().cloned(),
            extraction_error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }
}

/// Application service that owns the session lifecycle.
#[derive(Clone)]
pub struct Interviewer {
    forms: Arc<dyn FormRepository>,
    sessions: Arc<dyn SessionRepository>,
    records: Arc<dyn RecordSink>,
    elicitation: ElicitationEngine,
    extraction: ExtractionEngine,
    in_flight: Arc<Mutex<HashSet<SessionId>>>,
}

/// Marks a session busy until dropped.
struct InFlight {
    sessions: Arc<Mutex<HashSet<SessionId>>>,
    id: SessionId,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        lock(&self.sessions).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Interviewer {
    pub fn new(
        forms: Arc<dyn FormRepository>,
        sessions: Arc<dyn SessionRepository>,
        records: Arc<dyn RecordSink>,
        elicitation: ElicitationEngine,
        extraction: ExtractionEngine,
    ) -> Self {
        Self {
            forms,
            sessions,
            records,
            elicitation,
            extraction,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Forms
    // ─────────────────────────────────────────────────────────────────────────

    /// Validates and stores a new form.
    ///
    /// # Errors
    ///
    /// - `InvalidSchema` listing every problem with `fields`
    /// - `Validation` if the title is blank
    pub async fn register_form(
        &self,
        title: impl Into<String>,
        fields: Vec<FieldSpec>,
    ) -> Result<Form, InterviewError> {
        let schema = Schema::new(fields)?;
        let form = Form::new(title, schema).map_err(|e| InterviewError::Validation(e.to_string()))?;
        self.forms.save(&form).await?;

        info!(form_id = %form.id(), fields = form.schema().len(), "form registered");
        Ok(form)
    }

    pub async fn get_form(&self, form_id: FormId) -> Result<Form, InterviewError> {
        self.forms
            .find(form_id)
            .await?
            .ok_or(InterviewError::FormNotFound(form_id))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    /// Starts a session and generates its opening question.
    pub async fn start_session(&self, form_id: FormId) -> Result<TurnOutcome, InterviewError> {
        let form = self.get_form(form_id).await?;
        let mut session = Session::start(&form);
        let _busy = self.claim(session.id())?;

        let outcome = self.elicitation.next_turn(session.schema(), &[]).await;
        session.record_opening(&outcome)?;
        self.sessions.save(&session).await?;
        info!(session_id = %session.id(), form_id = %form_id, "session started");

        self.conclude(session, &outcome).await
    }

    /// Records a user message and produces the next assistant message.
    ///
    /// When the reply completes the session, extraction runs once. An
    /// extraction failure does not fail this call; it is reported in
    /// `TurnOutcome::extraction_error` and can be retried with
    /// [`retry_extraction`](Self::retry_extraction).
    ///
    /// # Errors
    ///
    /// - `Validation` if `text` is blank
    /// - `SessionBusy` if another request for the session is in progress
    /// - `SessionNotFound`, `SessionComplete`
    pub async fn submit_message(
        &self,
        session_id: SessionId,
        text: &str,
    ) -> Result<TurnOutcome, InterviewError> {
        self.advance(session_id, text, None).await
    }

    /// Streaming variant of [`submit_message`](Self::submit_message).
    ///
    /// Assistant text fragments are forwarded to `fragments` as they arrive.
    pub async fn submit_message_streaming(
        &self,
        session_id: SessionId,
        text: &str,
        fragments: mpsc::Sender<String>,
    ) -> Result<TurnOutcome, InterviewError> {
        self.advance(session_id, text, Some(fragments)).await
    }

    /// Runs extraction again for a complete session that has no result.
    ///
    /// # Errors
    ///
    /// - `NothingToExtract` if the session is still collecting or already has a result
    /// - `Extraction` if the attempt fails again
    pub async fn retry_extraction(
        &self,
        session_id: SessionId,
    ) -> Result<ExtractionResult, InterviewError> {
        let _busy = self.claim(session_id)?;
        let mut session = self.load(session_id).await?;
        if !session.needs_extraction() {
            return Err(InterviewError::NothingToExtract(session_id));
        }

        info!(session_id = %session_id, "retrying extraction");
        self.extract_and_store(&mut session).await
    }

    pub async fn get_session(&self, session_id: SessionId) -> Result<Session, InterviewError> {
        self.load(session_id).await
    }

    /// Sessions started from a form, oldest first.
    pub async fn list_sessions(&self, form_id: FormId) -> Result<Vec<Session>, InterviewError> {
        self.get_form(form_id).await?;
        Ok(self.sessions.list_by_form(form_id).await?)
    }

    /// Deletes a session together with its completed record.
    pub async fn delete_session(&self, session_id: SessionId) -> Result<(), InterviewError> {
        let _busy = self.claim(session_id)?;
        self.sessions.delete(session_id).await?;
        let had_record = self.records.remove(session_id).await?;

        info!(session_id = %session_id, had_record, "session deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────────

    fn claim(&self, id: SessionId) -> Result<InFlight, InterviewError> {
        if !lock(&self.in_flight).insert(id) {
            debug!(session_id = %id, "rejecting concurrent request");
            return Err(InterviewError::SessionBusy(id));
        }
        Ok(InFlight {
            sessions: Arc::clone(&self.in_flight),
            id,
        })
    }

    async fn load(&self, session_id: SessionId) -> Result<Session, InterviewError> {
        self.sessions
            .find(session_id)
            .await?
            .ok_or(InterviewError::SessionNotFound(session_id))
    }

    async fn advance(
        &self,
        session_id: SessionId,
        text: &str,
        fragments: Option<mpsc::Sender<String>>,
    ) -> Result<TurnOutcome, InterviewError> {
        if text.trim().is_empty() {
            return Err(InterviewError::Validation(
                "message cannot be empty".to_string(),
            ));
        }

        let _busy = self.claim(session_id)?;
        let mut session = self.load(session_id).await?;
        if !session.accepts_user_input() {
            return Err(InterviewError::SessionComplete(session_id));
        }

        let pending = session.pending_conversation(text);
        let outcome = match fragments {
            Some(tx) => {
                self.elicitation
                    .next_turn_streaming(session.schema(), &pending, tx)
                    .await
            }
            None => self.elicitation.next_turn(session.schema(), &pending).await,
        };

        session.record_exchange(text, &outcome)?;
        self.sessions.save(&session).await?;
        debug!(
            session_id = %session_id,
            turns = session.conversation().len(),
            complete = outcome.complete,
            "turn recorded"
        );

        self.conclude(session, &outcome).await
    }

    /// Runs extraction if the session just completed, then builds the outcome.
    async fn conclude(
        &self,
        mut session: Session,
        outcome: &ElicitationOutcome,
    ) -> Result<TurnOutcome, InterviewError> {
        if !session.needs_extraction() {
            return Ok(TurnOutcome::new(&session, outcome));
        }

        info!(session_id = %session.id(), "collection complete; extracting");
        match self.extract_and_store(&mut session).await {
            Ok(_) => Ok(TurnOutcome::new(&session, outcome)),
            Err(InterviewError::Extraction(err)) => {
                let mut turn = TurnOutcome::new(&session, outcome);
                turn.extraction_error = Some(err.to_string());
                Ok(turn)
            }
            Err(other) => Err(other),
        }
    }

    async fn extract_and_store(
        &self,
        session: &mut Session,
    ) -> Result<ExtractionResult, InterviewError> {
        let result = match self
            .extraction
            .extract(session.conversation(), session.schema())
            .await
        {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    session_id = %session.id(),
                    error = %err,
                    transient = err.is_transient(),
                    "extraction failed"
                );
                return Err(err.into());
            }
        };

        session.attach_result(result.clone())?;
        if let Some(record) = session.completed_record() {
            self.records.store(&record).await?;
        }
        self.sessions.save(session).await?;

        info!(session_id = %session.id(), fields = result.len(), "extraction stored");
        Ok(result)
    }
}
