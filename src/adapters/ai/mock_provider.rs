//! Mock AI Provider for testing.
//!
//! Provides a configurable mock implementation of the AIProvider port,
//! allowing engines, the interviewer, and HTTP routes to be tested without
//! calling a real model.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Multiple candidates per response
//! - Simulated delays for in-flight testing
//! - Error injection, both up front and mid-stream
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockAIProvider::new()
//!     .with_response("How are you feeling today?")
//!     .with_delay(Duration::from_millis(100));
//!
//! let response = provider.complete(request).await?;
//! assert_eq!(response.content, "How are you feeling today?");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, CompletionStream, FinishReason,
    ProviderInfo, StreamChunk, TokenUsage,
};

/// Reply used once the queue is exhausted.
const DEFAULT_REPLY: &str = "Mock response";

/// Mock AI provider for testing.
///
/// Clones share the same queue and call history.
#[derive(Debug, Clone)]
pub struct MockAIProvider {
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Provider info to return.
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion. The first candidate is the content.
    Success {
        candidates: Vec<String>,
        usage: TokenUsage,
        finish_reason: FinishReason,
    },
    /// Stream `partial`, then fail. Behaves like `Error` for `complete`.
    BrokenStream { partial: String, error: MockError },
    /// Return an error.
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    /// Simulate rate limiting.
    RateLimited { retry_after_secs: u32 },
    /// Simulate context too long.
    ContextTooLong,
    /// Simulate content filtering.
    ContentFiltered { reason: String },
    /// Simulate provider unavailable.
    Unavailable { message: String },
    /// Simulate authentication failure.
    AuthenticationFailed,
    /// Simulate network error.
    Network { message: String },
    /// Simulate timeout.
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for AIError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => AIError::rate_limited(retry_after_secs),
            MockError::ContextTooLong => AIError::ContextTooLong,
            MockError::ContentFiltered { reason } => AIError::content_filtered(reason),
            MockError::Unavailable { message } => AIError::unavailable(message),
            MockError::AuthenticationFailed => AIError::AuthenticationFailed,
            MockError::Network { message } => AIError::network(message),
            MockError::Timeout { timeout_secs } => AIError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockAIProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1")
                .with_streaming(true)
                .with_candidates(true),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful single-candidate response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.with_candidates(vec![content.into()])
    }

    /// Adds a successful response carrying several candidates.
    pub fn with_candidates(self, candidates: Vec<String>) -> Self {
        self.push(MockResponse::Success {
            candidates,
            usage: TokenUsage::new(10, 20),
            finish_reason: FinishReason::Stop,
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Adds a stream that yields `partial` and then fails with `error`.
    pub fn with_broken_stream(self, partial: impl Into<String>, error: MockError) -> Self {
        self.push(MockResponse::BrokenStream {
            partial: partial.into(),
            error,
        })
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the provider info.
    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn push(self, response: MockResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    /// Records the call, waits out the delay, and pops the next response.
    async fn begin(&self, request: CompletionRequest) -> MockResponse {
        lock(&self.calls).push(request);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                candidates: vec![DEFAULT_REPLY.to_string()],
                usage: TokenUsage::new(5, 10),
                finish_reason: FinishReason::Stop,
            })
    }
}

/// Splits text into word-sized fragments whose concatenation is the input.
fn fragments(text: &str) -> Vec<Result<StreamChunk, AIError>> {
    text.split_inclusive(' ')
        .map(|piece| Ok(StreamChunk::content(piece)))
        .collect()
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        match self.begin(request).await {
            MockResponse::Success {
                candidates,
                usage,
                finish_reason,
            } => Ok(CompletionResponse {
                content: candidates.first().cloned().unwrap_or_default(),
                candidates,
                usage,
                model: self.info.model.clone(),
                finish_reason,
            }),
            MockResponse::BrokenStream { error, .. } | MockResponse::Error(error) => {
                Err(error.into())
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<CompletionStream, AIError> {
        let delay = self.delay;

        match self.begin(request).await {
            MockResponse::Success {
                candidates,
                usage,
                finish_reason,
            } => {
                let content = candidates.into_iter().next().unwrap_or_default();
                let final_chunk = stream::once(async move {
                    if !delay.is_zero() {
                        sleep(delay / 10).await;
                    }
                    Ok(StreamChunk::final_chunk(finish_reason, usage))
                });
                Ok(Box::pin(stream::iter(fragments(&content)).chain(final_chunk)))
            }
            MockResponse::BrokenStream { partial, error } => {
                let failure = stream::once(async move { Err(AIError::from(error)) });
                Ok(Box::pin(stream::iter(fragments(&partial)).chain(failure)))
            }
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MessageRole;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new().with_message(MessageRole::User, "Hello")
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_response() {
        let provider = MockAIProvider::new().with_response("Hello from mock!");

        let response = provider.complete(test_request()).await.unwrap();

        assert_eq!(response.content, "Hello from mock!");
        assert_eq!(response.candidates, vec!["Hello from mock!".to_string()]);
        assert_eq!(response.model, "mock-model-1");
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_provider_returns_responses_in_order() {
        let provider = MockAIProvider::new()
            .with_response("First")
            .with_response("Second");

        let r1 = provider.complete(test_request()).await.unwrap();
        let r2 = provider.complete(test_request()).await.unwrap();
        let r3 = provider.complete(test_request()).await.unwrap();

        assert_eq!(r1.content, "First");
        assert_eq!(r2.content, "Second");
        assert_eq!(r3.content, DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn mock_provider_returns_all_candidates() {
        let provider =
            MockAIProvider::new().with_candidates(vec!["One".to_string(), "Two".to_string()]);

        let response = provider.complete(test_request()).await.unwrap();
        assert_eq!(response.content, "One");
        assert_eq!(response.all_candidates(), vec!["One".to_string(), "Two".to_string()]);
    }

    #[tokio::test]
    async fn mock_provider_returns_configured_error() {
        let provider =
            MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 });

        let err = provider.complete(test_request()).await.unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, AIError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn mock_provider_tracks_calls() {
        let provider = MockAIProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.complete(test_request()).await.unwrap();
        provider.clone().complete(test_request()).await.unwrap();
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.get_calls()[0].messages[0].content, "Hello");
    }

    #[tokio::test]
    async fn streaming_fragments_concatenate_to_content() {
        let provider = MockAIProvider::new().with_response("Hello  world from streaming");

        let mut stream = provider.stream_complete(test_request()).await.unwrap();

        let mut content = String::new();
        let mut final_chunk = None;
        let mut fragments = 0;
        while let Some(result) = stream.next().await {
            let chunk = result.unwrap();
            if chunk.is_final() {
                final_chunk = Some(chunk);
            } else {
                fragments += 1;
                content.push_str(&chunk.delta);
            }
        }

        assert_eq!(content, "Hello  world from streaming");
        assert!(fragments > 1);
        assert_eq!(final_chunk.unwrap().finish_reason, Some(FinishReason::Stop));
    }

    #[tokio::test]
    async fn streaming_start_error() {
        let provider = MockAIProvider::new().with_error(MockError::Unavailable {
            message: "Service down".to_string(),
        });

        match provider.stream_complete(test_request()).await {
            Ok(_) => panic!("Expected error, got stream"),
            Err(err) => assert!(matches!(err, AIError::Unavailable { .. })),
        }
    }

    #[tokio::test]
    async fn broken_stream_yields_partial_then_error() {
        let provider = MockAIProvider::new()
            .with_broken_stream("How many", MockError::Network { message: "reset".to_string() });

        let items: Vec<_> = provider.stream_complete(test_request()).await.unwrap().collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().delta, "How ");
        assert!(matches!(items[2], Err(AIError::Network(_))));
    }

    #[tokio::test]
    async fn mock_provider_respects_delay() {
        let provider = MockAIProvider::new().with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.complete(test_request()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn mock_provider_returns_info() {
        let info = ProviderInfo::new("custom", "custom-model").with_streaming(false);
        let provider = MockAIProvider::new().with_provider_info(info);

        let info = provider.provider_info();
        assert_eq!(info.name, "custom");
        assert_eq!(info.model, "custom-model");
        assert!(!info.supports_streaming);
    }

    #[test]
    fn mock_error_converts_to_ai_error() {
        let err: AIError = MockError::ContextTooLong.into();
        assert!(matches!(err, AIError::ContextTooLong));

        let err: AIError = MockError::AuthenticationFailed.into();
        assert!(matches!(err, AIError::AuthenticationFailed));

        let err: AIError = MockError::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, AIError::Timeout { timeout_secs: 30 }));
    }
}
