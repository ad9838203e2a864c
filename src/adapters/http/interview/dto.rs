//! HTTP DTOs for form and interview endpoints.
//!
//! These types decouple the HTTP API from domain types, allowing independent evolution.

use serde::{Deserialize, Serialize};

use crate::application::TurnOutcome;
use crate::domain::form::{FieldSpec, Form};
use crate::domain::interview::{ExtractionResult, Session, SessionStatus, Turn};

// ════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════

/// Request to register a form.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormRequest {
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

/// Request carrying one user message.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct FormResponse {
    pub id: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
    pub created_at: String,
}

impl From<Form> for FormResponse {
    fn from(form: Form) -> Self {
        Self {
            id: form.id().to_string(),
            title: form.title().to_string(),
            fields: form.schema().fields().to_vec(),
            created_at: form.created_at().to_rfc3339(),
        }
    }
}

/// Result of starting a session or sending a message.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResponse {
    pub session_id: String,
    pub message: String,
    pub status: SessionStatus,
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

impl From<TurnOutcome> for TurnResponse {
    fn from(outcome: TurnOutcome) -> Self {
        Self {
            session_id: outcome.session_id.to_string(),
            complete: outcome.is_complete(),
            message: outcome.message,
            status: outcome.status,
            result: outcome.result,
            extraction_error: outcome.extraction_error,
        }
    }
}

/// Full session view.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub form_id: String,
    pub status: SessionStatus,
    pub conversation: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id().to_string(),
            form_id: session.form_id().to_string(),
            status: session.status(),
            conversation: session.conversation().to_vec(),
            result: session.result().cloned(),
            created_at: session.created_at().to_rfc3339(),
            updated_at: session.updated_at().to_rfc3339(),
            completed_at: session.completed_at().map(|t| t.to_rfc3339()),
        }
    }
}

/// Session summary for list responses.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummaryResponse {
    pub id: String,
    pub status: SessionStatus,
    pub turns: usize,
    pub has_result: bool,
    pub updated_at: String,
}

impl From<&Session> for SessionSummaryResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id().to_string(),
            status: session.status(),
            turns: session.conversation().len(),
            has_result: session.result().is_some(),
            updated_at: session.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub items: Vec<SessionSummaryResponse>,
    pub total: usize,
}

/// Result of an explicit extraction request.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResponse {
    pub session_id: String,
    pub result: ExtractionResult,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
