//! Schema - the ordered field list of a form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::field::FieldSpec;

/// All problems found while validating a schema.
///
/// Every issue is reported at once so a form author can fix them together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid schema: {}", .issues.join("; "))]
pub struct SchemaError {
    pub issues: Vec<String>,
}

/// Ordered, validated sequence of fields.
///
/// Order is advisory: it is the order fields are presented to the model,
/// not an order the conversation must follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct Schema {
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Validates and builds a schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` listing every issue when the list is empty,
    /// a label repeats, or any field is itself invalid.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut issues = Vec::new();
        if fields.is_empty() {
            issues.push("Schema must contain at least one field".to_string());
        }

        let mut seen: Vec<&str> = Vec::new();
        for (index, field) in fields.iter().enumerate() {
            let id = if field.label.trim().is_empty() {
                format!("field {}", index + 1)
            } else {
                field.label.clone()
            };
            issues.extend(field.issues(&id));

            let label = field.label.as_str();
            if !label.trim().is_empty() {
                if seen.contains(&label) {
                    issues.push(format!("{}: Label must be unique", id));
                }
                seen.push(label);
            }
        }

        if issues.is_empty() {
            Ok(Self { fields })
        } else {
            Err(SchemaError { issues })
        }
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.label.as_str())
    }

    /// Looks up a field by label.
    pub fn field(&self, label: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.label == label)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Bulleted field listing, one `FieldSpec::prompt_line` per line.
    pub fn prompt_listing(&self) -> String {
        self.fields
            .iter()
            .map(FieldSpec::prompt_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<FieldSpec>> for Schema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Schema::new(fields)
    }
}

impl From<Schema> for Vec<FieldSpec> {
    fn from(schema: Schema) -> Self {
        schema.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diary_fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::choice("Mood", "How the user feels today", ["Low", "Fine", "Great"]),
            FieldSpec::number("HoursSlept", "Hours slept last night"),
            FieldSpec::text("Notes", "Anything else worth recording"),
        ]
    }

    #[test]
    fn accepts_valid_fields() {
        let schema = Schema::new(diary_fields()).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.labels().collect::<Vec<_>>(), vec!["Mood", "HoursSlept", "Notes"]);
        assert!(schema.field("HoursSlept").is_some());
        assert!(schema.field("Missing").is_none());
    }

    #[test]
    fn rejects_empty_schema() {
        let err = Schema::new(vec![]).unwrap_err();
        assert_eq!(err.issues, vec!["Schema must contain at least one field".to_string()]);
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut fields = diary_fields();
        fields.push(FieldSpec::number("Mood", "Numeric mood"));
        let err = Schema::new(fields).unwrap_err();
        assert_eq!(err.issues, vec!["Mood: Label must be unique".to_string()]);
    }

    #[test]
    fn collects_every_issue() {
        let fields = vec![
            FieldSpec::text("", "no label"),
            FieldSpec::choice("Mood", "", Vec::<String>::new()),
        ];
        let err = Schema::new(fields).unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                "field 1: Label is required".to_string(),
                "Mood: Description is required".to_string(),
                "Mood: Allowed values are required".to_string(),
            ]
        );
        assert!(err.to_string().starts_with("Invalid schema: field 1: Label is required"));
    }

    #[test]
    fn prompt_listing_keeps_declaration_order() {
        let schema = Schema::new(diary_fields()).unwrap();
        let listing = schema.prompt_listing();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("- Mood (choice"));
        assert!(lines[1].starts_with("- HoursSlept (number)"));
        assert!(lines[2].starts_with("- Notes (string)"));
    }

    #[test]
    fn deserialization_validates() {
        let bad = serde_json::json!([{ "label": "Mood", "description": "", "type": "string" }]);
        assert!(serde_json::from_value::<Schema>(bad).is_err());

        let good = serde_json::json!([{ "label": "Mood", "description": "How", "type": "string" }]);
        let schema: Schema = serde_json::from_value(good).unwrap();
        assert_eq!(schema.len(), 1);
    }
}
