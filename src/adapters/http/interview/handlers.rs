//! HTTP handlers for form and interview endpoints.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::application::{InterviewError, Interviewer};
use crate::domain::foundation::{ErrorCode, FormId, SessionId};

use super::dto::{
    CreateFormRequest, ErrorResponse, ExtractionResponse, FormResponse, SendMessageRequest,
    SessionListResponse, SessionResponse, SessionSummaryResponse, TurnResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct InterviewAppState {
    pub interviewer: Arc<Interviewer>,
}

impl InterviewAppState {
    pub fn new(interviewer: Arc<Interviewer>) -> Self {
        Self { interviewer }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Form handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/forms - Register a form
pub async fn create_form(
    State(state): State<InterviewAppState>,
    Json(req): Json<CreateFormRequest>,
) -> Response {
    match state.interviewer.register_form(req.title, req.fields).await {
        Ok(form) => (StatusCode::CREATED, Json(FormResponse::from(form))).into_response(),
        Err(e) => handle_interview_error(e),
    }
}

/// GET /api/forms/:id - Get a form
pub async fn get_form(
    State(state): State<InterviewAppState>,
    Path(form_id): Path<String>,
) -> Response {
    let form_id = match parse_id::<FormId>(&form_id, "form") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.get_form(form_id).await {
        Ok(form) => (StatusCode::OK, Json(FormResponse::from(form))).into_response(),
        Err(e) => handle_interview_error(e),
    }
}

/// POST /api/forms/:id/sessions - Start a session and get the opening question
pub async fn start_session(
    State(state): State<InterviewAppState>,
    Path(form_id): Path<String>,
) -> Response {
    let form_id = match parse_id::<FormId>(&form_id, "form") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.start_session(form_id).await {
        Ok(outcome) => (StatusCode::CREATED, Json(TurnResponse::from(outcome))).into_response(),
        Err(e) => handle_interview_error(e),
    }
}

/// GET /api/forms/:id/sessions - List a form's sessions
pub async fn list_sessions(
    State(state): State<InterviewAppState>,
    Path(form_id): Path<String>,
) -> Response {
    let form_id = match parse_id::<FormId>(&form_id, "form") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.list_sessions(form_id).await {
        Ok(sessions) => {
            let items: Vec<SessionSummaryResponse> = sessions.iter().map(Into::into).collect();
            let response = SessionListResponse {
                total: items.len(),
                items,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_interview_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session handlers
// ════════════════════════════════════════════════════════════════════════════

/// GET /api/sessions/:id - Get session details
pub async fn get_session(
    State(state): State<InterviewAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_id::<SessionId>(&session_id, "session") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.get_session(session_id).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(session))).into_response(),
        Err(e) => handle_interview_error(e),
    }
}

/// POST /api/sessions/:id/messages - Send a user message
pub async fn send_message(
    State(state): State<InterviewAppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let session_id = match parse_id::<SessionId>(&session_id, "session") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.submit_message(session_id, &req.message).await {
        Ok(outcome) => (StatusCode::OK, Json(TurnResponse::from(outcome))).into_response(),
        Err(e) => handle_interview_error(e),
    }
}

/// POST /api/sessions/:id/extract - Retry extraction for a complete session
pub async fn retry_extraction(
    State(state): State<InterviewAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_id::<SessionId>(&session_id, "session") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.retry_extraction(session_id).await {
        Ok(result) => {
            let response = ExtractionResponse {
                session_id: session_id.to_string(),
                result,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_interview_error(e),
    }
}

/// DELETE /api/sessions/:id - Delete a session and its record
pub async fn delete_session(
    State(state): State<InterviewAppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session_id = match parse_id::<SessionId>(&session_id, "session") {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.interviewer.delete_session(session_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => handle_interview_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, Response> {
    raw.parse::<T>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request(format!("Invalid {} ID", what))),
        )
            .into_response()
    })
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::InvalidSchema => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::FormNotFound | ErrorCode::SessionNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidStateTransition
        | ErrorCode::SessionComplete
        | ErrorCode::SessionBusy
        | ErrorCode::ResultAlreadyAttached => StatusCode::CONFLICT,
        ErrorCode::AIProviderError | ErrorCode::ExtractionFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::StorageError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_interview_error(err: InterviewError) -> Response {
    let code = err.code();
    let status = status_for(code);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(code = %code, error = %err, "request failed");
        "Internal server error".to_string()
    } else {
        err.to_string()
    };

    let mut body = ErrorResponse::new(code.to_string(), message);
    if let InterviewError::InvalidSchema(schema_err) = &err {
        body = body.with_details(serde_json::json!({ "issues": schema_err.issues }));
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::SchemaError;
    use crate::domain::interview::ExtractionError;

    #[test]
    fn not_found_maps_to_404() {
        let response = handle_interview_error(InterviewError::SessionNotFound(SessionId::new()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn busy_and_complete_map_to_409() {
        let id = SessionId::new();
        assert_eq!(
            handle_interview_error(InterviewError::SessionBusy(id)).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            handle_interview_error(InterviewError::SessionComplete(id)).status(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn invalid_schema_maps_to_422() {
        let err = InterviewError::InvalidSchema(SchemaError {
            issues: vec!["Mood: Description is required".to_string()],
        });
        assert_eq!(handle_interview_error(err).status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn extraction_failure_maps_to_502() {
        let err = InterviewError::Extraction(ExtractionError::Decode("prose".to_string()));
        assert_eq!(handle_interview_error(err).status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn storage_errors_are_masked() {
        let response =
            handle_interview_error(InterviewError::Storage("disk path /var/x".to_string()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], "STORAGE_ERROR");
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn bad_id_is_400() {
        let response = parse_id::<SessionId>("not-a-uuid", "session").unwrap_err();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
