use std::future::Future;
use std::time::Duration;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::{ChunkStream, CompletionRequest, InferenceBackend};
use crate::domain::{ChatMessage, DomainError};

/// Default target: Ollama running locally on its standard port.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
const CHAT_PATH: &str = "/api/chat";
const TAGS_PATH: &str = "/api/tags";
const PROBE_TIMEOUT_SECS: u64 = 5;

/// Connection settings for [`OllamaBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaConfig {
    /// Read configuration from the environment with local-first defaults:
    ///
    /// | Variable          | Default                  |
    /// |-------------------|--------------------------|
    /// | `OLLAMA_BASE_URL` | `http://localhost:11434` |
    /// | `OLLAMA_MODEL`    | `deepseek-r1:1.5b`       |
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self {
            base_url,
            model,
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ApiOptions,
}

#[derive(Serialize)]
struct ApiOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ApiResponse {
    message: ApiMessage,
}

#[derive(Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: String,
}

/// One line of a streamed `/api/chat` reply.
#[derive(Deserialize)]
struct StreamEvent {
    message: Option<ApiMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelDescriptor>,
}

#[derive(Deserialize)]
struct ModelDescriptor {
    name: String,
}

/// HTTP client for an Ollama server's `/api/chat` and `/api/tags` endpoints.
///
/// The chat timeout (60 s by default) bounds silence, not total duration:
/// connecting, waiting for the response head and each gap between body
/// chunks. A long reply that keeps streaming is never cut off. Reachability
/// and model listing use a short probe timeout so a stopped server is
/// reported quickly.
pub struct OllamaBackend {
    client: reqwest::Client,
    probe_client: reqwest::Client,
    timeout: Duration,
    model: String,
    chat_url: String,
    tags_url: String,
}

impl OllamaBackend {
    pub fn new(config: OllamaConfig) -> Result<Self, DomainError> {
        let base = config.base_url.trim_end_matches('/');
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::internal(format!("failed to build HTTP client: {e}")))?;
        let probe_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .timeout(Duration::from_secs(PROBE_TIMEOUT_SECS))
            .build()
            .map_err(|e| DomainError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            probe_client,
            timeout: config.timeout,
            model: config.model,
            chat_url: format!("{base}{CHAT_PATH}"),
            tags_url: format!("{base}{TAGS_PATH}"),
        })
    }

    pub fn from_env() -> Result<Self, DomainError> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    async fn send_chat(
        &self,
        request: &CompletionRequest,
        stream: bool,
    ) -> Result<reqwest::Response, DomainError> {
        let body = ApiRequest {
            model: &self.model,
            messages: &request.messages,
            stream,
            options: ApiOptions {
                temperature: request.temperature,
            },
        };

        let response = within(
            self.timeout,
            &self.chat_url,
            self.client.post(&self.chat_url).json(&body).send(),
        )
        .await?
        .map_err(|e| map_transport_error(&self.chat_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = within(self.timeout, &self.chat_url, response.text())
                .await?
                .unwrap_or_default();
            warn!("OllamaBackend: API returned {status}: {body}");
            return Err(DomainError::upstream(status.as_u16(), body));
        }

        Ok(response)
    }
}

#[async_trait]
impl InferenceBackend for OllamaBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, DomainError> {
        let response = self.send_chat(request, false).await?;
        let api_response: ApiResponse = within(self.timeout, &self.chat_url, response.json())
            .await?
            .map_err(|e| {
                DomainError::serialization(format!("OllamaBackend: failed to parse response: {e}"))
            })?;
        Ok(api_response.message.content)
    }

    async fn complete_stream(&self, request: &CompletionRequest) -> Result<ChunkStream, DomainError> {
        let response = self.send_chat(request, true).await?;
        let chat_url = self.chat_url.clone();
        Ok(Box::pin(decode_chunks(
            response.bytes_stream(),
            chat_url,
            self.timeout,
        )))
    }

    async fn is_reachable(&self) -> bool {
        match self.probe_client.get(&self.tags_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("OllamaBackend: {} not reachable: {e}", self.tags_url);
                false
            }
        }
    }

    async fn list_models(&self) -> Result<Vec<String>, DomainError> {
        let response = self
            .probe_client
            .get(&self.tags_url)
            .send()
            .await
            .map_err(|e| map_transport_error(&self.tags_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::upstream(status.as_u16(), body));
        }

        let tags: TagsResponse = response.json().await.map_err(|e| {
            DomainError::serialization(format!("OllamaBackend: failed to parse model list: {e}"))
        })?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn map_transport_error(url: &str, e: reqwest::Error) -> DomainError {
    if e.is_timeout() {
        DomainError::timeout(format!("no response from {url}: {e}"))
    } else if e.is_connect() {
        DomainError::unavailable(format!(
            "cannot connect to {url} (is `ollama serve` running?): {e}"
        ))
    } else if e.is_decode() {
        DomainError::serialization(format!("bad response body from {url}: {e}"))
    } else {
        DomainError::internal(format!("request to {url} failed: {e}"))
    }
}

/// Await `future`, failing with [`DomainError::UpstreamTimeout`] if it takes
/// longer than `timeout`.
async fn within<F: Future>(
    timeout: Duration,
    url: &str,
    future: F,
) -> Result<F::Output, DomainError> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| DomainError::timeout(format!("no response from {url} within {timeout:?}")))
}

/// Decode an NDJSON body into content fragments. `idle` bounds the wait for
/// each next network chunk.
fn decode_chunks<S, B>(
    bytes: S,
    url: String,
    idle: Duration,
) -> impl Stream<Item = Result<String, DomainError>> + Send
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    try_stream! {
        let mut decoder = NdjsonDecoder::default();
        futures_util::pin_mut!(bytes);

        while let Some(chunk) = within(idle, &url, bytes.next()).await? {
            let chunk = chunk.map_err(|e| map_transport_error(&url, e))?;
            for line in decoder.push(chunk.as_ref()) {
                let (content, done) = interpret_line(&line)?;
                if let Some(content) = content {
                    yield content;
                }
                if done {
                    return;
                }
            }
        }

        if let Some(line) = decoder.finish() {
            let (content, _) = interpret_line(&line)?;
            if let Some(content) = content {
                yield content;
            }
        }
    }
}

/// Parse one NDJSON line into its content fragment and the `done` flag.
fn interpret_line(line: &[u8]) -> Result<(Option<String>, bool), DomainError> {
    let event: StreamEvent = serde_json::from_slice(line)?;
    if let Some(error) = event.error {
        return Err(DomainError::upstream(200, error));
    }
    let content = event
        .message
        .map(|m| m.content)
        .filter(|c| !c.is_empty());
    Ok((content, event.done))
}

/// Splits a byte stream into complete, non-blank lines.
///
/// Network chunks may end mid-line or mid-character; bytes are held back until
/// the terminating newline arrives.
#[derive(Debug, Default)]
struct NdjsonDecoder {
    buffer: Vec<u8>,
}

impl NdjsonDecoder {
    fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let trimmed = trim_ascii(&line[..line.len() - 1]);
            if !trimmed.is_empty() {
                lines.push(trimmed.to_vec());
            }
        }
        lines
    }

    /// Whatever is left once the stream closes without a final newline.
    fn finish(self) -> Option<Vec<u8>> {
        let trimmed = trim_ascii(&self.buffer);
        (!trimmed.is_empty()).then(|| trimmed.to_vec())
    }
}

fn trim_ascii(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |p| p + 1);
    &bytes[start..end]
}
