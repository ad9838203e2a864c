//! Field specifications - the typed slots an interview fills in.

use serde::{Deserialize, Serialize};

/// The value type of a field.
///
/// Only `Choice` carries a value set; a number or free-text field can never
/// have allowed values attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// One of a closed set of values.
    Choice {
        /// Declared values, in the order they should be offered.
        allowed_values: Vec<String>,
    },
    /// A numeric value.
    Number,
    /// Free text, stored as a concise summary.
    String,
}

impl FieldKind {
    /// Short type name used in prompts and DTOs.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Choice { .. } => "choice",
            FieldKind::Number => "number",
            FieldKind::String => "string",
        }
    }
}

/// A single field to collect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldSpec")]
pub struct FieldSpec {
    /// Unique key; becomes the key in the extraction result.
    pub label: String,
    /// What the field means, shown to the model.
    pub description: String,
    /// Value type.
    #[serde(flatten)]
    pub kind: FieldKind,
    /// Allowed values sent with a non-choice type.
    #[serde(skip)]
    stray_values: Option<Vec<String>>,
}

/// Wire shape of a field before the type tag decides where values belong.
#[derive(Deserialize)]
struct RawFieldSpec {
    label: String,
    description: String,
    #[serde(rename = "type")]
    kind: KindTag,
    #[serde(default)]
    allowed_values: Option<Vec<String>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindTag {
    Choice,
    Number,
    String,
}

impl From<RawFieldSpec> for FieldSpec {
    fn from(raw: RawFieldSpec) -> Self {
        let (kind, stray_values) = match raw.kind {
            KindTag::Choice => (
                FieldKind::Choice {
                    allowed_values: raw.allowed_values.unwrap_or_default(),
                },
                None,
            ),
            KindTag::Number => (FieldKind::Number, raw.allowed_values),
            KindTag::String => (FieldKind::String, raw.allowed_values),
        };
        Self {
            label: raw.label,
            description: raw.description,
            kind,
            stray_values,
        }
    }
}

impl FieldSpec {
    /// Creates a choice field.
    pub fn choice<I, S>(label: impl Into<String>, description: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            description: description.into(),
            kind: FieldKind::Choice {
                allowed_values: values.into_iter().map(Into::into).collect(),
            },
            stray_values: None,
        }
    }

    /// Creates a number field.
    pub fn number(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            kind: FieldKind::Number,
            stray_values: None,
        }
    }

    /// Creates a free-text field.
    pub fn text(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: description.into(),
            kind: FieldKind::String,
            stray_values: None,
        }
    }

    /// Allowed values for a choice field, `None` otherwise.
    pub fn allowed_values(&self) -> Option<&[String]> {
        match &self.kind {
            FieldKind::Choice { allowed_values } => Some(allowed_values),
            _ => None,
        }
    }

    /// Returns the declared spelling of `candidate` if it names an allowed value.
    ///
    /// Matching ignores case and surrounding whitespace. Always `None` for
    /// non-choice fields.
    pub fn canonical_choice(&self, candidate: &str) -> Option<&str> {
        let wanted = candidate.trim();
        self.allowed_values()?
            .iter()
            .find(|v| v.trim().eq_ignore_ascii_case(wanted))
            .map(String::as_str)
    }

    /// One-line description for directives, e.g.
    /// `- Mood (choice; one of: "Low", "Fine", "Great"): how the user feels`.
    pub fn prompt_line(&self) -> String {
        let kind = match &self.kind {
            FieldKind::Choice { allowed_values } => {
                let quoted: Vec<String> = allowed_values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!("choice; one of: {}", quoted.join(", "))
            }
            FieldKind::Number => "number".to_string(),
            FieldKind::String => "string".to_string(),
        };
        format!("- {} ({}): {}", self.label, kind, self.description)
    }

    /// Collects validation issues for this field, each prefixed with `id`.
    pub(crate) fn issues(&self, id: &str) -> Vec<String> {
        let mut issues = Vec::new();
        if self.label.trim().is_empty() {
            issues.push(format!("{}: Label is required", id));
        }
        if self.description.trim().is_empty() {
            issues.push(format!("{}: Description is required", id));
        }
        if let FieldKind::Choice { allowed_values } = &self.kind {
            if allowed_values.is_empty() {
                issues.push(format!("{}: Allowed values are required", id));
            }
            if allowed_values.iter().any(|v| v.trim().is_empty()) {
                issues.push(format!("{}: Allowed values cannot be blank", id));
            }
            let mut seen: Vec<String> = Vec::new();
            for value in allowed_values {
                let key = value.trim().to_ascii_lowercase();
                if !key.is_empty() && seen.contains(&key) {
                    issues.push(format!("{}: Duplicate allowed value '{}'", id, value));
                }
                seen.push(key);
            }
        }
        if self.stray_values.is_some() {
            issues.push(format!(
                "{}: Allowed values are only valid for choice fields",
                id
            ));
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_field_exposes_allowed_values() {
        let field = FieldSpec::choice("Mood", "How the user feels", ["Low", "Fine", "Great"]);
        assert_eq!(
            field.allowed_values(),
            Some(&["Low".to_string(), "Fine".to_string(), "Great".to_string()][..])
        );
        assert_eq!(field.kind.type_name(), "choice");
    }

    #[test]
    fn number_field_has_no_allowed_values() {
        let field = FieldSpec::number("HoursSlept", "Hours of sleep last night");
        assert!(field.allowed_values().is_none());
        assert!(field.canonical_choice("7").is_none());
    }

    #[test]
    fn canonical_choice_ignores_case_and_whitespace() {
        let field = FieldSpec::choice("Mood", "How the user feels", ["Low", "Fine", "Great"]);
        assert_eq!(field.canonical_choice(" fine "), Some("Fine"));
        assert_eq!(field.canonical_choice("GREAT"), Some("Great"));
        assert_eq!(field.canonical_choice("Okay"), None);
    }

    #[test]
    fn prompt_line_lists_values() {
        let field = FieldSpec::choice("Mood", "How the user feels", ["Low", "Fine"]);
        assert_eq!(
            field.prompt_line(),
            "- Mood (choice; one of: \"Low\", \"Fine\"): How the user feels"
        );
        let field = FieldSpec::number("HoursSlept", "Hours slept");
        assert_eq!(field.prompt_line(), "- HoursSlept (number): Hours slept");
    }

    #[test]
    fn issues_report_missing_description_and_values() {
        let field = FieldSpec::choice("Mood", "", Vec::<String>::new());
        let issues = field.issues("Mood");
        assert_eq!(
            issues,
            vec![
                "Mood: Description is required".to_string(),
                "Mood: Allowed values are required".to_string(),
            ]
        );
    }

    #[test]
    fn issues_report_duplicate_values() {
        let field = FieldSpec::choice("Mood", "How", ["Fine", "fine"]);
        assert_eq!(field.issues("Mood"), vec!["Mood: Duplicate allowed value 'fine'".to_string()]);
    }

    #[test]
    fn serializes_with_type_tag() {
        let field = FieldSpec::choice("Mood", "How", ["Low"]);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "label": "Mood",
                "description": "How",
                "type": "choice",
                "allowed_values": ["Low"]
            })
        );

        let number: FieldSpec = serde_json::from_value(serde_json::json!({
            "label": "HoursSlept",
            "description": "Hours",
            "type": "number"
        }))
        .unwrap();
        assert_eq!(number.kind, FieldKind::Number);
    }

    #[test]
    fn number_with_allowed_values_is_an_issue() {
        let field: FieldSpec = serde_json::from_value(serde_json::json!({
            "label": "HoursSlept",
            "description": "Hours",
            "type": "number",
            "allowed_values": ["1", "2"]
        }))
        .unwrap();

        assert_eq!(field.kind, FieldKind::Number);
        assert_eq!(
            field.issues("HoursSlept"),
            vec!["HoursSlept: Allowed values are only valid for choice fields".to_string()]
        );
    }

    #[test]
    fn empty_allowed_values_on_text_field_is_still_an_issue() {
        let field: FieldSpec = serde_json::from_value(serde_json::json!({
            "label": "Notes",
            "description": "Anything else",
            "type": "string",
            "allowed_values": []
        }))
        .unwrap();
        assert_eq!(field.issues("Notes").len(), 1);
    }

    #[test]
    fn choice_without_allowed_values_reports_missing_values() {
        let field: FieldSpec = serde_json::from_value(serde_json::json!({
            "label": "Mood",
            "description": "How",
            "type": "choice"
        }))
        .unwrap();
        assert_eq!(field.issues("Mood"), vec!["Mood: Allowed values are required".to_string()]);
    }

    #[test]
    fn unknown_type_is_rejected() {
        let result = serde_json::from_value::<FieldSpec>(serde_json::json!({
            "label": "When",
            "description": "Date",
            "type": "date"
        }));
        assert!(result.is_err());
    }
}
