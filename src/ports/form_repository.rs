//! Form repository port.

use async_trait::async_trait;

use crate::domain::form::Form;
use crate::domain::foundation::FormId;

/// Errors that can occur during form storage operations.
#[derive(Debug, thiserror::Error)]
pub enum FormStoreError {
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Repository port for registered forms.
///
/// Forms are immutable once saved, so there is no update operation.
#[async_trait]
pub trait FormRepository: Send + Sync {
    async fn save(&self, form: &Form) -> Result<(), FormStoreError>;

    /// Returns `None` if no form has this id.
    async fn find(&self, id: FormId) -> Result<Option<Form>, FormStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_repository_is_object_safe() {
        fn _accepts_dyn(_repo: &dyn FormRepository) {}
    }
}
