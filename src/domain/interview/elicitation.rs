//! Elicitation engine - decides the next assistant message of an interview.
//!
//! The engine is stateless: it takes a schema and a conversation snapshot,
//! makes one model call, and reports the message together with whether the
//! model declared collection complete. It never mutates the conversation;
//! the caller appends the user turn and the returned assistant message.
//!
//! # Failure policy
//!
//! A failed model call is not an error for the caller. It becomes a visible
//! pseudo-message with `complete = false`, so the interview can continue (or
//! the user can try the turn again) instead of the session breaking.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::prompts::{contains_completion_sentence, elicitation_directive, OPENING_KICKOFF};
use super::turn::Turn;
use crate::domain::form::Schema;
use crate::ports::{AIError, AIProvider, CompletionRequest, Message};

/// Sampling parameters for elicitation calls.
#[derive(Debug, Clone, PartialEq)]
pub struct ElicitationConfig {
    /// Higher than extraction, for natural phrasing.
    pub temperature: f32,
    pub max_tokens: u32,
    /// Candidates requested per call; every one is checked for completion.
    pub candidates: u32,
}

impl Default for ElicitationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 300,
            candidates: 1,
        }
    }
}

/// Result of one elicitation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElicitationOutcome {
    /// Text to show the user and append as the assistant turn.
    pub message: String,
    /// True iff `message` contains the completion sentence verbatim.
    pub complete: bool,
}

impl ElicitationOutcome {
    /// Builds an outcome from a message, deriving `complete` from its text.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let complete = contains_completion_sentence(&message);
        Self { message, complete }
    }

    /// Picks the outcome from several candidates.
    ///
    /// The first candidate containing the completion sentence wins; otherwise
    /// the first candidate is used. An empty list yields an empty,
    /// incomplete message.
    pub fn from_candidates(candidates: Vec<String>) -> Self {
        if let Some(done) = candidates.iter().find(|c| contains_completion_sentence(c)) {
            return Self {
                message: done.clone(),
                complete: true,
            };
        }
        match candidates.into_iter().next() {
            Some(first) => Self::from_message(first),
            None => Self {
                message: String::new(),
                complete: false,
            },
        }
    }

    /// Visible stand-in for a failed model call.
    pub fn degraded(err: &AIError) -> Self {
        Self {
            message: format!("Error calling the language model: {}", err),
            complete: false,
        }
    }
}

/// Steers a conversation toward filling every field of a schema.
#[derive(Clone)]
pub struct ElicitationEngine {
    provider: Arc<dyn AIProvider>,
    config: ElicitationConfig,
}

impl ElicitationEngine {
    pub fn new(provider: Arc<dyn AIProvider>, config: ElicitationConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ElicitationConfig {
        &self.config
    }

    /// Builds the model request for the given snapshot.
    pub fn build_request(&self, schema: &Schema, conversation: &[Turn]) -> CompletionRequest {
        let mut messages: Vec<Message> = conversation.iter().map(Turn::to_message).collect();
        if messages.is_empty() {
            messages.push(Message::user(OPENING_KICKOFF));
        }

        let mut request = CompletionRequest::new()
            .with_system_prompt(elicitation_directive(schema))
            .with_messages(messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens);
        if self.config.candidates > 1 && self.provider.provider_info().supports_candidates {
            request = request.with_candidates(self.config.candidates);
        }
        request
    }

    /// Produces the next assistant message for `conversation`.
    pub async fn next_turn(&self, schema: &Schema, conversation: &[Turn]) -> ElicitationOutcome {
        let request = self.build_request(schema, conversation);
        debug!(
            turns = conversation.len(),
            fields = schema.len(),
            "requesting elicitation turn"
        );

        match self.provider.complete(request).await {
            Ok(response) => {
                let outcome = ElicitationOutcome::from_candidates(response.all_candidates());
                debug!(complete = outcome.complete, model = %response.model, "elicitation turn generated");
                outcome
            }
            Err(err) => {
                warn!(
                    error = %err,
                    transient = err.is_transient(),
                    "elicitation call failed; returning degraded message"
                );
                ElicitationOutcome::degraded(&err)
            }
        }
    }

    /// Streaming variant of [`next_turn`](Self::next_turn).
    ///
    /// Every text fragment is forwarded to `fragments` as it arrives. The
    /// completion check runs on the concatenation of all fragments only.
    /// A dropped receiver does not stop collection of the full message.
    pub async fn next_turn_streaming(
        &self,
        schema: &Schema,
        conversation: &[Turn],
        fragments: mpsc::Sender<String>,
    ) -> ElicitationOutcome {
        if !self.provider.provider_info().supports_streaming {
            let outcome = self.next_turn(schema, conversation).await;
            let _ = fragments.send(outcome.message.clone()).await;
            return outcome;
        }

        let mut request = self.build_request(schema, conversation);
        // Streams carry a single candidate.
        request.candidates = None;

        let mut stream = match self.provider.stream_complete(request).await {
            Ok(stream) => stream,
            Err(err) => {
                warn!(error = %err, transient = err.is_transient(), "elicitation stream failed to start");
                return ElicitationOutcome::degraded(&err);
            }
        };

        let mut message = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    let is_final = chunk.is_final();
                    if !chunk.delta.is_empty() {
                        message.push_str(&chunk.delta);
                        let _ = fragments.send(chunk.delta).await;
                    }
                    if is_final {
                        break;
                    }
                }
                Err(err) => {
                    warn!(
                        error = %err,
                        transient = err.is_transient(),
                        received = message.len(),
                        "elicitation stream broke"
                    );
                    return ElicitationOutcome::degraded(&err);
                }
            }
        }

        ElicitationOutcome::from_message(message)
    }
}
