//! Form - a titled schema that interview sessions are started from.

use serde::{Deserialize, Serialize};

use super::schema::Schema;
use crate::domain::foundation::{FormId, Timestamp, ValidationError};

/// A registered form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    id: FormId,
    title: String,
    schema: Schema,
    created_at: Timestamp,
}

impl Form {
    /// Creates a new form from an already-validated schema.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyField` if the title is blank.
    pub fn new(title: impl Into<String>, schema: Schema) -> Result<Self, ValidationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ValidationError::empty_field("title"));
        }
        Ok(Self {
            id: FormId::new(),
            title: title.trim().to_string(),
            schema,
            created_at: Timestamp::now(),
        })
    }

    pub fn id(&self) -> FormId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::FieldSpec;

    fn schema() -> Schema {
        Schema::new(vec![FieldSpec::number("HoursSlept", "Hours slept")]).unwrap()
    }

    #[test]
    fn new_trims_title() {
        let form = Form::new("  Daily diary ", schema()).unwrap();
        assert_eq!(form.title(), "Daily diary");
        assert_eq!(form.schema().len(), 1);
    }

    #[test]
    fn new_rejects_blank_title() {
        let err = Form::new("   ", schema()).unwrap_err();
        assert_eq!(err, ValidationError::empty_field("title"));
    }
}
