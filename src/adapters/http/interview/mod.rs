//! HTTP adapter for form and interview endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateFormRequest, ErrorResponse, ExtractionResponse, FormResponse, SendMessageRequest,
    SessionListResponse, SessionResponse, SessionSummaryResponse, TurnResponse,
};
pub use handlers::InterviewAppState;
pub use routes::interview_router;
