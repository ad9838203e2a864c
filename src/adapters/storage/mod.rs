//! Storage Adapters
//!
//! Implementations of the repository and record sink ports.
//!
//! ## Available Adapters
//!
//! - **InMemoryFormRepository** / **InMemorySessionRepository** - memory (testing/development)
//! - **FileSessionRepository** - one YAML file per session
//! - **InMemoryRecordSink** - completed records in memory
//! - **JsonlRecordSink** - completed records appended to a JSON Lines file
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionRepository, JsonlRecordSink};
//!
//! let sessions = FileSessionRepository::new("./data/sessions");
//! let records = JsonlRecordSink::new("./data/records.jsonl");
//! ```

mod file_session_repository;
mod in_memory_record_sink;
mod in_memory_repositories;
mod jsonl_record_sink;

pub use file_session_repository::FileSessionRepository;
pub use in_memory_record_sink::InMemoryRecordSink;
pub use in_memory_repositories::{InMemoryFormRepository, InMemorySessionRepository};
pub use jsonl_record_sink::JsonlRecordSink;
