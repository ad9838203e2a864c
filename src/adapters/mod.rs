//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - Language model providers (OpenAI-compatible, mock)
//! - `http` - REST API over the interviewer
//! - `storage` - Form, session, and record stores (in-memory, file)

pub mod ai;
pub mod http;
pub mod storage;
