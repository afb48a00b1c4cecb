use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::application::{
    BatchChatUseCase, ClientFactory, ClientSettings, Clock, InferenceBackend, InferenceClient,
    ManageScenariosUseCase, ScenarioRepository, SessionLimits, SessionStore,
};
use crate::connector::{InMemoryScenarioRepository, MockBackend, OllamaBackend, OllamaConfig, SystemClock};

pub struct ContainerConfig {
    pub ollama: OllamaConfig,
    /// Answer every request from an in-process echo backend instead of Ollama.
    pub mock_backend: bool,
    pub client: ClientSettings,
    pub session_limits: SessionLimits,
    /// JSON file of extra scenarios registered at startup.
    pub scenarios_file: Option<PathBuf>,
}

/// One entry of a `--scenarios-file`.
#[derive(Debug, Deserialize)]
struct ScenarioEntry {
    key: String,
    name: String,
    system_prompt: String,
    temperature: Option<f32>,
}

/// Wires the backend, scenario registry and clock, and hands out use cases.
pub struct Container {
    backend: Arc<dyn InferenceBackend>,
    scenario_repo: Arc<dyn ScenarioRepository>,
    clock: Arc<dyn Clock>,
    factory: ClientFactory,
    config: ContainerConfig,
}

impl Container {
    pub async fn new(config: ContainerConfig) -> Result<Self> {
        let backend: Arc<dyn InferenceBackend> = if config.mock_backend {
            debug!("Using mock inference backend");
            Arc::new(MockBackend::new())
        } else {
            debug!(
                "Using Ollama at {} with model {}",
                config.ollama.base_url, config.ollama.model
            );
            Arc::new(OllamaBackend::new(config.ollama.clone())?)
        };

        Self::with_backend(config, backend).await
    }

    /// Build around an already constructed backend.
    pub async fn with_backend(
        config: ContainerConfig,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self> {
        let scenario_repo: Arc<dyn ScenarioRepository> =
            Arc::new(InMemoryScenarioRepository::with_builtins());
        let factory = ClientFactory::new(
            Arc::clone(&backend),
            Arc::clone(&scenario_repo),
            config.client,
        );

        let container = Self {
            backend,
            scenario_repo,
            clock: Arc::new(SystemClock),
            factory,
            config,
        };

        if let Some(path) = container.config.scenarios_file.clone() {
            container.load_scenarios(&path).await?;
        }

        Ok(container)
    }

    async fn load_scenarios(&self, path: &Path) -> Result<()> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read scenarios file {}", path.display()))?;
        let entries: Vec<ScenarioEntry> = serde_json::from_str(&json)
            .with_context(|| format!("Invalid scenarios file {}", path.display()))?;

        let use_case = self.scenarios_use_case();
        for entry in &entries {
            use_case
                .add(&entry.key, &entry.name, &entry.system_prompt, entry.temperature)
                .await?;
        }
        debug!("Loaded {} scenarios from {}", entries.len(), path.display());
        Ok(())
    }

    pub fn client_factory(&self) -> ClientFactory {
        self.factory.clone()
    }

    pub fn new_client(&self) -> InferenceClient {
        self.factory.build()
    }

    pub fn scenarios_use_case(&self) -> ManageScenariosUseCase {
        ManageScenariosUseCase::new(Arc::clone(&self.scenario_repo))
    }

    pub fn batch_use_case(&self) -> BatchChatUseCase {
        BatchChatUseCase::new(self.factory.clone())
    }

    /// A fresh, empty session store. Each front-end owns its own.
    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(
            self.factory.clone(),
            Arc::clone(&self.clock),
            self.config.session_limits,
        )
    }

    pub fn backend(&self) -> Arc<dyn InferenceBackend> {
        Arc::clone(&self.backend)
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    pub fn base_url(&self) -> &str {
        if self.config.mock_backend {
            "mock://"
        } else {
            &self.config.ollama.base_url
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(scenarios_file: Option<PathBuf>) -> ContainerConfig {
        ContainerConfig {
            ollama: OllamaConfig::default(),
            mock_backend: true,
            client: ClientSettings::default(),
            session_limits: SessionLimits::default(),
            scenarios_file,
        }
    }

    #[tokio::test]
    async fn scenarios_file_registers_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenarios.json");
        std::fs::write(
            &path,
            r#"[{"key":"pirate","name":"Pirate","system_prompt":"Talk like a pirate.","temperature":0.8},
                {"key":"plain","name":"Plain","system_prompt":"Be plain."}]"#,
        )
        .unwrap();

        let container = Container::new(config(Some(path))).await.unwrap();
        let use_case = container.scenarios_use_case();

        let pirate = use_case.get("pirate").await.unwrap().unwrap();
        assert_eq!(pirate.temperature(), 0.8);
        assert!(use_case.get("plain").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn missing_scenarios_file_is_an_error() {
        let result = Container::new(config(Some(PathBuf::from("/nonexistent/s.json")))).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn session_stores_are_independent() {
        let container = Container::new(config(None)).await.unwrap();
        let rest = container.session_store();
        let web = container.session_store();

        rest.get_or_create(Some("abc")).await;

        assert!(web.get("abc").await.is_none());
        assert_eq!(container.base_url(), "mock://");
    }
}
