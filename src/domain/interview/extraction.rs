//! Extraction engine - turns a finished conversation into typed values.
//!
//! The model is asked, at near-zero temperature, to act as a parser and
//! return one JSON object keyed by field label. Its reply is decoded
//! strictly and then conformed to the schema, so the result always has
//! exactly the schema's keys and correctly typed values no matter what the
//! model actually returned.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::prompts::extraction_directive;
use super::result::{ExtractionResult, FieldValue};
use super::turn::{render_transcript, Turn};
use crate::domain::form::{FieldKind, FieldSpec, Schema};
use crate::ports::{AIError, AIProvider, CompletionRequest, Message};

/// Errors that end an extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The model call itself failed.
    #[error("language model call failed: {0}")]
    Provider(#[from] AIError),

    /// The model replied, but not with a bare JSON object.
    #[error("model reply is not a valid JSON object: {0}")]
    Decode(String),
}

impl ExtractionError {
    /// True when retrying the same extraction may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractionError::Provider(err) => err.is_transient(),
            ExtractionError::Decode(_) => false,
        }
    }
}

/// Sampling parameters for extraction calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 300,
        }
    }
}

/// Converts completed conversations into `ExtractionResult`s.
#[derive(Clone)]
pub struct ExtractionEngine {
    provider: Arc<dyn AIProvider>,
    config: ExtractionConfig,
}

impl ExtractionEngine {
    pub fn new(provider: Arc<dyn AIProvider>, config: ExtractionConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Builds the parser request: directive as system prompt, whole
    /// transcript as a single user message.
    pub fn build_request(&self, conversation: &[Turn], schema: &Schema) -> CompletionRequest {
        let transcript = format!("Transcript:\n\n{}", render_transcript(conversation));
        CompletionRequest::new()
            .with_system_prompt(extraction_directive(schema))
            .with_messages([Message::user(transcript)])
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
    }

    /// Extracts one value per schema field from `conversation`.
    ///
    /// # Errors
    ///
    /// - `ExtractionError::Provider` if the model call fails
    /// - `ExtractionError::Decode` if the reply is not a bare JSON object
    pub async fn extract(
        &self,
        conversation: &[Turn],
        schema: &Schema,
    ) -> Result<ExtractionResult, ExtractionError> {
        let request = self.build_request(conversation, schema);
        debug!(turns = conversation.len(), fields = schema.len(), "requesting extraction");

        let response = self.provider.complete(request).await.map_err(|err| {
            warn!(error = %err, "extraction call failed");
            ExtractionError::from(err)
        })?;

        let parsed = parse_reply(&response.content).map_err(|err| {
            warn!(error = %err, reply = %response.content, "extraction reply rejected");
            err
        })?;

        let ignored = parsed.keys().filter(|k| schema.field(k).is_none()).count();
        if ignored > 0 {
            debug!(ignored, "dropping keys not in schema");
        }

        Ok(conform(&parsed, schema))
    }
}

/// Strictly decodes the model reply as a JSON object.
///
/// Surrounding whitespace is ignored; anything else (prose, code fences,
/// arrays, scalars) is a decode error.
pub fn parse_reply(raw: &str) -> Result<Map<String, Value>, ExtractionError> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ExtractionError::Decode(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
        Err(err) => Err(ExtractionError::Decode(err.to_string())),
    }
}

/// Builds the result with exactly the schema's labels as keys.
pub fn conform(parsed: &Map<String, Value>, schema: &Schema) -> ExtractionResult {
    let values: BTreeMap<String, FieldValue> = schema
        .fields()
        .iter()
        .map(|field| (field.label.clone(), conform_value(field, parsed.get(&field.label))))
        .collect();
    ExtractionResult::from_values(values)
}

/// Coerces one raw value to its field's type. Unusable values become empty.
fn conform_value(field: &FieldSpec, raw: Option<&Value>) -> FieldValue {
    let Some(raw) = raw else {
        return FieldValue::empty();
    };

    match &field.kind {
        FieldKind::Choice { .. } => match raw {
            Value::String(s) => field
                .canonical_choice(s)
                .map(FieldValue::text)
                .unwrap_or_else(FieldValue::empty),
            Value::Number(n) => field
                .canonical_choice(&n.to_string())
                .map(FieldValue::text)
                .unwrap_or_else(FieldValue::empty),
            _ => FieldValue::empty(),
        },
        FieldKind::Number => match raw {
            Value::Number(n) => FieldValue::Number(n.clone()),
            Value::String(s) => parse_number(s)
                .map(FieldValue::Number)
                .unwrap_or_else(FieldValue::empty),
            _ => FieldValue::empty(),
        },
        FieldKind::String => match raw {
            Value::String(s) => FieldValue::text(s.trim()),
            Value::Null => FieldValue::empty(),
            Value::Number(n) => FieldValue::text(n.to_string()),
            Value::Bool(b) => FieldValue::text(b.to_string()),
            other => FieldValue::text(other.to_string()),
        },
    }
}

fn parse_number(s: &str) -> Option<serde_json::Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i.into());
    }
    s.parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(serde_json::Number::from_f64)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError};
    use crate::ports::MessageRole;
    use proptest::prelude::*;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::choice("Mood", "How the user feels", ["Low", "Fine", "Great"]),
            FieldSpec::number("HoursSlept", "Hours slept last night"),
        ])
        .unwrap()
    }

    fn conversation() -> Vec<Turn> {
        vec![
            Turn::assistant("How are you feeling today, and how did you sleep?"),
            Turn::user("I feel fine, slept about 7 hours"),
        ]
    }

    fn engine(provider: &MockAIProvider) -> ExtractionEngine {
        ExtractionEngine::new(Arc::new(provider.clone()), ExtractionConfig::default())
    }

    mod parse {
        use super::*;

        #[test]
        fn accepts_bare_object_with_whitespace() {
            let map = parse_reply("  {\"Mood\": \"Fine\"}\n").unwrap();
            assert_eq!(map.get("Mood"), Some(&json!("Fine")));
        }

        #[test]
        fn rejects_prose_prefix() {
            let err = parse_reply(r#"Sure! {"Mood": "Fine"}"#).unwrap_err();
            assert!(matches!(err, ExtractionError::Decode(_)));
        }

        #[test]
        fn rejects_code_fences() {
            let err = parse_reply("```json\n{\"Mood\": \"Fine\"}\n```").unwrap_err();
            assert!(matches!(err, ExtractionError::Decode(_)));
        }

        #[test]
        fn rejects_non_object_json() {
            let err = parse_reply("[1, 2]").unwrap_err();
            assert_eq!(
                err.to_string(),
                "model reply is not a valid JSON object: expected an object, got an array"
            );
        }
    }

    mod conform_values {
        use super::*;

        fn conform_json(value: Value) -> ExtractionResult {
            let map = match value {
                Value::Object(map) => map,
                _ => unreachable!(),
            };
            conform(&map, &schema())
        }

        #[test]
        fn missing_keys_default_to_empty_string() {
            let result = conform_json(json!({}));
            assert_eq!(result.to_json(), json!({ "Mood": "", "HoursSlept": "" }));
        }

        #[test]
        fn extraneous_keys_are_dropped() {
            let result = conform_json(json!({ "Mood": "Fine", "HoursSlept": 7, "Extra": "x" }));
            assert_eq!(result.labels().collect::<Vec<_>>(), vec!["HoursSlept", "Mood"]);
        }

        #[test]
        fn choice_is_canonicalised_or_cleared() {
            assert_eq!(conform_json(json!({ "Mood": "fine" })).get("Mood"), Some(&FieldValue::text("Fine")));
            assert_eq!(conform_json(json!({ "Mood": "Okay" })).get("Mood"), Some(&FieldValue::empty()));
            assert_eq!(conform_json(json!({ "Mood": 3 })).get("Mood"), Some(&FieldValue::empty()));
        }

        #[test]
        fn numeric_strings_become_numbers() {
            let result = conform_json(json!({ "HoursSlept": "7" }));
            assert_eq!(result.get("HoursSlept"), Some(&FieldValue::from(7_i64)));

            let result = conform_json(json!({ "HoursSlept": " 7.5 " }));
            assert_eq!(result.get("HoursSlept").and_then(FieldValue::as_f64), Some(7.5));
        }

        #[test]
        fn unparseable_numbers_are_cleared() {
            let result = conform_json(json!({ "HoursSlept": "about seven" }));
            assert_eq!(result.get("HoursSlept"), Some(&FieldValue::empty()));

            let result = conform_json(json!({ "HoursSlept": "NaN" }));
            assert_eq!(result.get("HoursSlept"), Some(&FieldValue::empty()));
        }

        #[test]
        fn string_fields_render_scalars() {
            let schema = Schema::new(vec![FieldSpec::text("Notes", "Anything else")]).unwrap();
            let map = json!({ "Notes": true }).as_object().cloned().unwrap();
            assert_eq!(conform(&map, &schema).get("Notes"), Some(&FieldValue::text("true")));

            let map = json!({ "Notes": null }).as_object().cloned().unwrap();
            assert_eq!(conform(&map, &schema).get("Notes"), Some(&FieldValue::empty()));
        }
    }

    mod extract {
        use super::*;

        #[tokio::test]
        async fn round_trip_mood_and_hours() {
            let provider = MockAIProvider::new().with_response(r#"{"Mood": "Fine", "HoursSlept": 7}"#);
            let result = engine(&provider).extract(&conversation(), &schema()).await.unwrap();

            assert_eq!(result.to_json(), json!({ "Mood": "Fine", "HoursSlept": 7 }));
        }

        #[tokio::test]
        async fn request_is_deterministic_parser_call() {
            let provider = MockAIProvider::new().with_response("{}");
            engine(&provider).extract(&conversation(), &schema()).await.unwrap();

            let calls = provider.get_calls();
            assert_eq!(calls.len(), 1);
            let request = &calls[0];
            assert_eq!(request.temperature, Some(0.0));
            assert_eq!(request.messages.len(), 1);
            assert_eq!(request.messages[0].role, MessageRole::User);
            assert!(request.messages[0].content.contains("User: I feel fine, slept about 7 hours"));
            assert!(request.system_prompt.as_ref().unwrap().contains("Return valid JSON only"));
        }

        #[tokio::test]
        async fn prose_prefixed_reply_is_decode_failure() {
            let provider = MockAIProvider::new().with_response(r#"Sure! {"Mood": "Fine"}"#);
            let err = engine(&provider).extract(&conversation(), &schema()).await.unwrap_err();
            assert!(matches!(err, ExtractionError::Decode(_)));
        }

        #[tokio::test]
        async fn provider_failure_is_distinct_error() {
            let provider = MockAIProvider::new().with_error(MockError::AuthenticationFailed);
            let err = engine(&provider).extract(&conversation(), &schema()).await.unwrap_err();
            assert!(matches!(err, ExtractionError::Provider(AIError::AuthenticationFailed)));
            assert!(!err.is_transient());
        }

        #[test]
        fn only_flaky_provider_failures_are_transient() {
            assert!(ExtractionError::Provider(AIError::rate_limited(5)).is_transient());
            assert!(ExtractionError::Provider(AIError::network("reset")).is_transient());
            assert!(!ExtractionError::Decode("not json".into()).is_transient());
        }
    }

    proptest! {
        #[test]
        fn keyset_always_matches_schema(
            mood in prop::option::of("[A-Za-z ]{0,10}"),
            hours in prop::option::of(-100i64..100),
            extra in prop::collection::btree_map("[a-z]{1,8}", "[a-z]{0,5}", 0..4),
        ) {
            let mut map = Map::new();
            for (k, v) in extra {
                map.insert(k, Value::from(v));
            }
            if let Some(m) = mood {
                map.insert("Mood".to_string(), Value::from(m));
            }
            if let Some(h) = hours {
                map.insert("HoursSlept".to_string(), Value::from(h));
            }

            let result = conform(&map, &schema());
            prop_assert_eq!(result.labels().collect::<Vec<_>>(), vec!["HoursSlept", "Mood"]);

            let mood = result.get("Mood").unwrap();
            let allowed = ["", "Low", "Fine", "Great"];
            prop_assert!(mood.as_str().map(|s| allowed.contains(&s)).unwrap_or(false));

            let hours = result.get("HoursSlept").unwrap();
            prop_assert!(hours.is_empty() || hours.as_f64().is_some());
        }

        #[test]
        fn numeric_looking_strings_never_survive_as_text(n in -10_000i64..10_000) {
            let mut map = Map::new();
            map.insert("HoursSlept".to_string(), Value::from(n.to_string()));
            let result = conform(&map, &schema());
            prop_assert_eq!(result.get("HoursSlept"), Some(&FieldValue::from(n)));
        }
    }
}
