//! Directives sent to the language model.
//!
//! The completion sentence is a wire-level contract: the elicitation
//! directive asks the model to say it verbatim, and the elicitation engine
//! detects completion by looking for it verbatim. Changing one without the
//! other breaks the protocol.

use serde_json::{Map, Value};

use crate::domain::form::{FieldKind, Schema};

/// Sentence the model must emit, verbatim, once every field is answered.
pub const COMPLETION_SENTENCE: &str = "I have all the information I need. We can finalize now.";

/// Value recorded for a field the user persistently declines to answer.
pub const REFUSED_VALUE: &str = "REFUSED";

/// Synthetic first user message for a brand-new conversation.
///
/// Some chat APIs reject a request without any user turn; this one carries
/// no information, so the opening question still comes from the schema alone.
pub const OPENING_KICKOFF: &str = "Hello, I'm ready to begin.";

/// Returns true iff `message` contains the completion sentence exactly.
///
/// Case-sensitive; punctuation must match.
pub fn contains_completion_sentence(message: &str) -> bool {
    message.contains(COMPLETION_SENTENCE)
}

/// System directive for the elicitation engine.
pub fn elicitation_directive(schema: &Schema) -> String {
    format!(
        r#"You are a warm, patient interviewer collecting information from a participant through conversation.

You must collect the following fields:
{fields}

Rules:
1. Ask exactly one clarifying question at a time, about a field that is still missing or whose answer is vague.
2. The participant may answer several fields in one reply; accept that and move on to whatever is still missing. You may cover fields in any order.
3. For choice fields, the final answer must map to one of the listed values. If the participant's wording does not match, confirm which listed value fits best.
4. For number fields, make sure you get a number (an estimate is fine).
5. If the participant is unsure or unwilling, offer examples or propose a best guess based on what they have already said, and ask them to confirm it.
6. Only as a last resort, if the participant persistently declines to answer a field, record it as "{refused}" and move on.
7. Once every field is sufficiently answered, reply with this exact sentence, verbatim:
"{sentence}"
After saying that sentence, do not ask any further questions.

Be empathetic, concise, and thorough."#,
        fields = schema.prompt_listing(),
        refused = REFUSED_VALUE,
        sentence = COMPLETION_SENTENCE,
    )
}

/// System directive for the extraction engine.
pub fn extraction_directive(schema: &Schema) -> String {
    let skeleton = serde_json::to_string_pretty(&Value::Object(empty_skeleton(schema)))
        .unwrap_or_else(|_| "{}".to_string());

    let mut rules = Vec::new();
    for field in schema.fields() {
        let rule = match &field.kind {
            FieldKind::Choice { allowed_values } => {
                let quoted: Vec<String> = allowed_values.iter().map(|v| format!("\"{}\"", v)).collect();
                format!(
                    "- \"{}\": exactly one of {}. Pick the closest match to what the user said; never invent a new value.",
                    field.label,
                    quoted.join(", ")
                )
            }
            FieldKind::Number => format!(
                "- \"{}\": a JSON number, not a string.",
                field.label
            ),
            FieldKind::String => format!(
                "- \"{}\": a concise summary of what the user said.",
                field.label
            ),
        };
        rules.push(rule);
    }

    format!(
        r#"You are a data parser. You do not converse. Read the interview transcript you are given and output a single JSON object with exactly these keys:
{skeleton}

Typing rules:
{rules}

If information for a field is missing, use an empty string for choice and string fields and 0 for number fields.
Return valid JSON only, with no surrounding text, explanation, or code fences."#,
        skeleton = skeleton,
        rules = rules.join("\n"),
    )
}

/// `{label: ""|0}` object used to show the model the expected shape.
fn empty_skeleton(schema: &Schema) -> Map<String, Value> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let empty = match field.kind {
                FieldKind::Number => Value::from(0),
                _ => Value::from(""),
            };
            (field.label.clone(), empty)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::form::FieldSpec;
    use proptest::prelude::*;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSpec::choice("Mood", "How the user feels", ["Low", "Fine", "Great"]),
            FieldSpec::number("HoursSlept", "Hours slept last night"),
        ])
        .unwrap()
    }

    #[test]
    fn detects_exact_sentence_anywhere() {
        assert!(contains_completion_sentence(COMPLETION_SENTENCE));
        assert!(contains_completion_sentence(&format!(
            "Thanks! {} Take care.",
            COMPLETION_SENTENCE
        )));
    }

    #[test]
    fn rejects_near_misses() {
        assert!(!contains_completion_sentence(
            "I have all the information I need. We can finalize now"
        ));
        assert!(!contains_completion_sentence(
            "i have all the information i need. we can finalize now."
        ));
        assert!(!contains_completion_sentence(
            "I have all the information I need.  We can finalize now."
        ));
    }

    #[test]
    fn elicitation_directive_lists_fields_and_contract() {
        let directive = elicitation_directive(&schema());
        assert!(directive.contains("- Mood (choice; one of: \"Low\", \"Fine\", \"Great\")"));
        assert!(directive.contains("- HoursSlept (number)"));
        assert!(directive.contains(COMPLETION_SENTENCE));
        assert!(directive.contains(REFUSED_VALUE));
        assert!(directive.contains("one clarifying question at a time"));
    }

    #[test]
    fn extraction_directive_shows_skeleton_and_rules() {
        let directive = extraction_directive(&schema());
        assert!(directive.contains("\"Mood\": \"\""));
        assert!(directive.contains("\"HoursSlept\": 0"));
        assert!(directive.contains("a JSON number, not a string"));
        assert!(directive.contains("never invent a new value"));
        assert!(directive.contains("Return valid JSON only"));
    }

    fn positions(keep: fn(char) -> bool) -> Vec<usize> {
        COMPLETION_SENTENCE
            .char_indices()
            .filter(|(_, c)| keep(*c))
            .map(|(i, _)| i)
            .collect()
    }

    fn wrap(reply: &str) -> String {
        format!("Thanks for that. {} Bye", reply)
    }

    proptest! {
        #[test]
        fn flipped_case_is_not_completion(index in prop::sample::select(positions(|c| c.is_ascii_alphabetic()))) {
            let mut mutated: Vec<char> = COMPLETION_SENTENCE.chars().collect();
            let c = mutated[index];
            mutated[index] = if c.is_ascii_uppercase() {
                c.to_ascii_lowercase()
            } else {
                c.to_ascii_uppercase()
            };
            let mutated: String = mutated.into_iter().collect();
            prop_assert!(!contains_completion_sentence(&wrap(&mutated)));
        }

        #[test]
        fn dropped_character_is_not_completion(index in 0..COMPLETION_SENTENCE.len()) {
            let mut mutated = COMPLETION_SENTENCE.to_string();
            mutated.remove(index);
            prop_assert!(!contains_completion_sentence(&wrap(&mutated)));
        }

        #[test]
        fn swapped_punctuation_is_not_completion(
            index in prop::sample::select(positions(|c| c == '.')),
            replacement in prop::sample::select(vec![',', '!', '?', ';']),
        ) {
            let mut mutated = COMPLETION_SENTENCE.to_string();
            mutated.replace_range(index..=index, &replacement.to_string());
            prop_assert!(!contains_completion_sentence(&wrap(&mutated)));
        }
    }

    #[test]
    fn exact_sentence_inside_reply_is_completion() {
        assert!(contains_completion_sentence(&wrap(COMPLETION_SENTENCE)));
    }
}
