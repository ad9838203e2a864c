//! Application layer - orchestrates the interview lifecycle over the ports.

mod interviewer;

pub use interviewer::{InterviewError, Interviewer, TurnOutcome};
