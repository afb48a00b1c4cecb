use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;
use tracing::debug;

use crate::application::{ChunkStream, CompletionRequest, InferenceBackend};
use crate::domain::{DomainError, Role};

const MOCK_MODEL: &str = "mock-model";

/// Offline backend that answers every request by echoing the last user
/// message. Used by `--mock-backend` and by tests.
///
/// A failure marker makes any request whose user message contains it fail
/// with an upstream error; streamed requests fail after the first chunk.
pub struct MockBackend {
    reachable: bool,
    fail_marker: Option<String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            reachable: true,
            fail_marker: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A backend that behaves like a server that is not running.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests().pop()
    }

    fn record(&self, request: &CompletionRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
    }

    fn last_user_message(request: &CompletionRequest) -> &str {
        request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    fn should_fail(&self, request: &CompletionRequest) -> bool {
        self.fail_marker
            .as_deref()
            .is_some_and(|marker| Self::last_user_message(request).contains(marker))
    }

    fn check_reachable(&self) -> Result<(), DomainError> {
        if self.reachable {
            Ok(())
        } else {
            Err(DomainError::unavailable("mock backend is offline"))
        }
    }

    fn reply_for(request: &CompletionRequest) -> String {
        format!("Echo: {}", Self::last_user_message(request))
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        self.check_reachable()?;
        self.record(request);

        if self.should_fail(request) {
            return Err(DomainError::upstream(500, "mock failure"));
        }

        let reply = Self::reply_for(request);
        debug!("Mock backend replying with {} bytes", reply.len());
        Ok(reply)
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, DomainError> {
        self.check_reachable()?;
        self.record(request);

        let reply = Self::reply_for(request);
        let mut chunks: Vec<Result<String, DomainError>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(word.to_string()))
            .collect();

        if self.should_fail(request) {
            chunks.truncate(1);
            chunks.push(Err(DomainError::upstream(500, "mock failure mid-stream")));
        }

        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn is_reachable(&self) -> bool {
        self.reachable
    }

    async fn list_models(&self) -> Result<Vec<String>, DomainError> {
        self.check_reachable()?;
        Ok(vec![MOCK_MODEL.to_string()])
    }

    fn model_name(&self) -> &str {
        MOCK_MODEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatMessage;
    use futures_util::StreamExt;

    fn request(text: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::system("sys"), ChatMessage::user(text)],
            temperature: 0.5,
        }
    }

    #[tokio::test]
    async fn echoes_last_user_message() {
        let backend = MockBackend::new();
        let reply = backend.complete(&request("hello there")).await.unwrap();
        assert_eq!(reply, "Echo: hello there");
        assert_eq!(backend.requests().len(), 1);
    }

    #[tokio::test]
    async fn stream_chunks_concatenate_to_full_reply() {
        let backend = MockBackend::new();
        let stream = backend.complete_stream(&request("a b c")).await.unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks.concat(), "Echo: a b c");
    }

    #[tokio::test]
    async fn offline_backend_refuses_requests() {
        let backend = MockBackend::unreachable();
        let err = backend.complete(&request("hi")).await.unwrap_err();
        assert!(matches!(err, DomainError::UpstreamUnavailable(_)));
        assert!(backend.list_models().await.is_err());
    }
}
