//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - Chat-completion language model
//! - `FormRepository` - Registered forms
//! - `SessionRepository` - Interview sessions between turns
//! - `RecordSink` - Completed interview records

mod ai_provider;
mod form_repository;
mod record_sink;
mod session_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    Message, MessageRole, ProviderInfo, StreamChunk, TokenUsage,
};
pub use form_repository::{FormRepository, FormStoreError};
pub use record_sink::{RecordSink, RecordSinkError};
pub use session_repository::{SessionRepository, SessionStoreError};
