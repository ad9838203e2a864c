//! Record Sink Port - Where completed interviews end up.
//!
//! A sink receives one `CompletedRecord` per successfully extracted session.
//! What it does with the record (keep it in memory, append it to a file,
//! forward it to another system) is up to the adapter.

use async_trait::async_trait;

use crate::domain::foundation::SessionId;
use crate::domain::interview::CompletedRecord;

/// Errors that can occur while storing or removing records.
#[derive(Debug, thiserror::Error)]
pub enum RecordSinkError {
    #[error("Failed to serialize record: {0}")]
    SerializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for storing completed interview records.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Stores a completed record.
    ///
    /// Storing a second record for the same session replaces the first.
    async fn store(&self, record: &CompletedRecord) -> Result<(), RecordSinkError>;

    /// Removes the record of a session.
    ///
    /// Returns `true` if a record was removed, `false` if none existed.
    async fn remove(&self, session_id: SessionId) -> Result<bool, RecordSinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_sink_is_object_safe() {
        fn _accepts_dyn(_sink: &dyn RecordSink) {}
    }
}
