//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where sessions and completed records are kept
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for session YAML files (`file` backend)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// JSON Lines file for completed records (`file` backend)
    #[serde(default = "default_records_path")]
    pub records_path: PathBuf,
}

/// Storage backend type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Lost on restart
    #[default]
    Memory,
    File,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File {
            if self.data_dir.as_os_str().is_empty() {
                return Err(ValidationError::MissingRequired("STORAGE__DATA_DIR"));
            }
            if self.records_path.as_os_str().is_empty() {
                return Err(ValidationError::MissingRequired("STORAGE__RECORDS_PATH"));
            }
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            records_path: default_records_path(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data/sessions")
}

fn default_records_path() -> PathBuf {
    PathBuf::from("./data/records.jsonl")
}
