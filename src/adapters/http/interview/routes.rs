//! Route configuration for form and interview endpoints.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{
    create_form, delete_session, get_form, get_session, list_sessions, retry_extraction,
    send_message, start_session, InterviewAppState,
};

/// Creates the interview router with all endpoints.
///
/// Routes:
/// - `POST /api/forms` - Register a form
/// - `GET /api/forms/:id` - Get a form
/// - `POST /api/forms/:id/sessions` - Start a session
/// - `GET /api/forms/:id/sessions` - List a form's sessions
/// - `GET /api/sessions/:id` - Get a session
/// - `DELETE /api/sessions/:id` - Delete a session and its record
/// - `POST /api/sessions/:id/messages` - Send a user message
/// - `POST /api/sessions/:id/extract` - Retry extraction
pub fn interview_router() -> Router<InterviewAppState> {
    Router::new()
        .route("/api/forms", post(create_form))
        .route("/api/forms/:id", get(get_form))
        .route("/api/forms/:id/sessions", post(start_session).get(list_sessions))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/messages", post(send_message))
        .route("/api/sessions/:id/extract", post(retry_extraction))
}
