use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_stream::try_stream;
use futures_util::{Stream, StreamExt};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::{ChunkStream, CompletionRequest, InferenceBackend, ScenarioRepository};
use crate::domain::{
    ChatMessage, ChatOptions, ChatReply, ConversationHistory, DomainError, HistoryWindow,
    Scenario, DEFAULT_SCENARIO, DEFAULT_TEMPERATURE,
};

/// What to do when a request names a scenario the registry does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScenarioPolicy {
    /// Use the `default` scenario, log a warning and flag the reply.
    #[default]
    Fallback,
    /// Fail with [`DomainError::NotFound`].
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientSettings {
    pub scenario_policy: ScenarioPolicy,
    pub history_window: HistoryWindow,
}

struct PreparedCall {
    request: CompletionRequest,
    scenario: String,
    fell_back: bool,
}

/// Builds chat requests from scenarios and conversation state and sends them
/// to an [`InferenceBackend`].
///
/// Each client owns one [`ConversationHistory`]. Calls made with
/// `use_history` read the history window into the request and, once the
/// model has answered in full, append the user message and the reply. Calls
/// without it neither read nor write history, so both kinds can be freely
/// interleaved on one client.
pub struct InferenceClient {
    backend: Arc<dyn InferenceBackend>,
    scenarios: Arc<dyn ScenarioRepository>,
    settings: ClientSettings,
    history: Arc<Mutex<ConversationHistory>>,
}

impl InferenceClient {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        scenarios: Arc<dyn ScenarioRepository>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            backend,
            scenarios,
            settings,
            history: Arc::new(Mutex::new(ConversationHistory::new())),
        }
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub fn settings(&self) -> ClientSettings {
        self.settings
    }

    /// Explicit override, else the scenario's own temperature.
    ///
    /// [`DEFAULT_TEMPERATURE`] applies through [`Scenario::fallback`] when no
    /// scenario can be resolved at all.
    pub fn effective_temperature(requested: Option<f32>, scenario: &Scenario) -> f32 {
        requested.unwrap_or_else(|| scenario.temperature())
    }

    async fn resolve_scenario(&self, key: &str) -> Result<(Scenario, bool), DomainError> {
        if let Some(scenario) = self.scenarios.find_by_key(key).await? {
            return Ok((scenario, false));
        }

        match self.settings.scenario_policy {
            ScenarioPolicy::Strict => Err(DomainError::not_found(format!(
                "Scenario not found: {}",
                key
            ))),
            ScenarioPolicy::Fallback => {
                warn!(
                    "Unknown scenario '{}', falling back to '{}'",
                    key, DEFAULT_SCENARIO
                );
                let scenario = self
                    .scenarios
                    .find_by_key(DEFAULT_SCENARIO)
                    .await?
                    .unwrap_or_else(Scenario::fallback);
                Ok((scenario, true))
            }
        }
    }

    async fn prepare(
        &self,
        user_message: &str,
        options: &ChatOptions,
    ) -> Result<PreparedCall, DomainError> {
        let (scenario, fell_back) = self.resolve_scenario(&options.scenario).await?;
        let temperature = Self::effective_temperature(options.temperature, &scenario);

        let mut messages = vec![ChatMessage::system(scenario.system_prompt())];
        if options.use_history {
            let history = self.history.lock().await;
            messages.extend_from_slice(history.window(self.settings.history_window));
        }
        messages.push(ChatMessage::user(user_message));

        debug!(
            "Prepared request: scenario={}, temperature={}, messages={}",
            scenario.key(),
            temperature,
            messages.len()
        );

        Ok(PreparedCall {
            request: CompletionRequest {
                messages,
                temperature,
            },
            scenario: scenario.key().to_string(),
            fell_back,
        })
    }

    /// Send one message and wait for the complete reply.
    ///
    /// On failure the history is left exactly as it was.
    pub async fn chat(
        &self,
        user_message: &str,
        options: &ChatOptions,
    ) -> Result<ChatReply, DomainError> {
        let prepared = self.prepare(user_message, options).await?;
        let content = self.backend.complete(&prepared.request).await?;

        if options.use_history {
            self.history.lock().await.push_turn(user_message, content.as_str());
        }

        Ok(ChatReply {
            content,
            scenario: prepared.scenario,
            temperature: prepared.request.temperature,
            fell_back: prepared.fell_back,
        })
    }

    /// Send one message and receive the reply as it is generated.
    ///
    /// The returned stream can be consumed once. With `use_history` the turn
    /// is recorded only after the stream has ended without error; dropping it
    /// early or hitting an error records nothing.
    pub async fn chat_stream(
        &self,
        user_message: &str,
        options: &ChatOptions,
    ) -> Result<ChunkStream, DomainError> {
        let prepared = self.prepare(user_message, options).await?;
        let upstream = self.backend.complete_stream(&prepared.request).await?;

        let history = options
            .use_history
            .then(|| Arc::clone(&self.history));

        Ok(Box::pin(record_on_completion(
            upstream,
            history,
            user_message.to_string(),
        )))
    }

    pub async fn is_reachable(&self) -> bool {
        self.backend.is_reachable().await
    }

    /// Installed model names; empty when the server cannot be asked.
    pub async fn list_models(&self) -> Vec<String> {
        match self.backend.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Failed to list models: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn history(&self) -> ConversationHistory {
        self.history.lock().await.clone()
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    pub async fn clear_history(&self) {
        self.history.lock().await.clear();
    }

    /// Write the full history to `path` as an indented JSON array.
    pub async fn export_history(&self, path: impl AsRef<Path>) -> Result<PathBuf, DomainError> {
        let path = path.as_ref().to_path_buf();
        let json = self.history.lock().await.to_json_pretty()?;
        tokio::fs::write(&path, json).await?;
        info!("Exported conversation to {}", path.display());
        Ok(path)
    }

    /// Replace the history with the contents of an exported file and return
    /// the number of entries loaded.
    pub async fn import_history(&self, path: impl AsRef<Path>) -> Result<usize, DomainError> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        let imported = ConversationHistory::from_json(&json)?;
        let count = imported.len();
        *self.history.lock().await = imported;
        info!(
            "Imported {} messages from {}",
            count,
            path.as_ref().display()
        );
        Ok(count)
    }
}

fn record_on_completion(
    mut upstream: ChunkStream,
    history: Option<Arc<Mutex<ConversationHistory>>>,
    user_message: String,
) -> impl Stream<Item = Result<String, DomainError>> + Send {
    try_stream! {
        let mut reply = String::new();
        while let Some(chunk) = upstream.next().await {
            let chunk = chunk?;
            reply.push_str(&chunk);
            yield chunk;
        }

        if let Some(history) = history {
            history.lock().await.push_turn(user_message, reply);
        }
    }
}

/// Produces fresh [`InferenceClient`]s sharing one backend and registry.
#[derive(Clone)]
pub struct ClientFactory {
    backend: Arc<dyn InferenceBackend>,
    scenarios: Arc<dyn ScenarioRepository>,
    settings: ClientSettings,
}

impl ClientFactory {
    pub fn new(
        backend: Arc<dyn InferenceBackend>,
        scenarios: Arc<dyn ScenarioRepository>,
        settings: ClientSettings,
    ) -> Self {
        Self {
            backend,
            scenarios,
            settings,
        }
    }

    pub fn build(&self) -> InferenceClient {
        InferenceClient::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.scenarios),
            self.settings,
        )
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }
}
