//! Interview module - conversational collection of a form's fields.
//!
//! - `elicitation` - steers the conversation and detects completion
//! - `extraction` - turns a finished transcript into typed values
//! - `session` - the session aggregate and its lifecycle

mod elicitation;
mod extraction;
mod prompts;
mod result;
mod session;
mod status;
mod turn;

pub use elicitation::{ElicitationConfig, ElicitationEngine, ElicitationOutcome};
pub use extraction::{conform, parse_reply, ExtractionConfig, ExtractionEngine, ExtractionError};
pub use prompts::{
    contains_completion_sentence, elicitation_directive, extraction_directive, COMPLETION_SENTENCE,
    OPENING_KICKOFF, REFUSED_VALUE,
};
pub use result::{CompletedRecord, ExtractionResult, FieldValue};
pub use session::Session;
pub use status::SessionStatus;
pub use turn::{render_transcript, Role, Turn};
