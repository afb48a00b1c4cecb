use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::domain::{ChatMessage, DomainError};

/// Incremental text fragments of a streamed completion, in arrival order.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, DomainError>> + Send>>;

/// A fully assembled request for the model endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Transport to a chat-completion server.
///
/// Implementors own the wire format, URLs and timeouts. The inference client
/// only decides *what* to send; it never sees HTTP.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Single round trip returning the assistant's full reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError>;

    /// Open a streamed round trip. Errors before the first byte are returned
    /// directly; errors mid-stream arrive as stream items.
    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, DomainError>;

    /// Whether the server answers at all. Never fails.
    async fn is_reachable(&self) -> bool;

    /// Names of the models installed on the server.
    async fn list_models(&self) -> Result<Vec<String>, DomainError>;

    /// Model every request is sent to.
    fn model_name(&self) -> &str;
}
