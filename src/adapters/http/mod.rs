//! HTTP adapters - REST API implementations.

pub mod interview;

pub use interview::{interview_router, InterviewAppState};
