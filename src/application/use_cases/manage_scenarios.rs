use std::sync::Arc;

use tracing::info;

use crate::application::ScenarioRepository;
use crate::domain::{DomainError, Scenario, ScenarioSummary, DEFAULT_TEMPERATURE};

/// List, look up and register scenarios.
pub struct ManageScenariosUseCase {
    scenario_repo: Arc<dyn ScenarioRepository>,
}

impl ManageScenariosUseCase {
    pub fn new(scenario_repo: Arc<dyn ScenarioRepository>) -> Self {
        Self { scenario_repo }
    }

    pub async fn list(&self) -> Result<Vec<ScenarioSummary>, DomainError> {
        Ok(self
            .scenario_repo
            .list()
            .await?
            .iter()
            .map(Scenario::summary)
            .collect())
    }

    pub async fn get(&self, key: &str) -> Result<Option<Scenario>, DomainError> {
        self.scenario_repo.find_by_key(key).await
    }

    /// Register a scenario, replacing any existing one with the same key.
    ///
    /// Only the key and name must be non-blank; prompt and temperature are
    /// taken as given.
    pub async fn add(
        &self,
        key: &str,
        name: &str,
        system_prompt: &str,
        temperature: Option<f32>,
    ) -> Result<Scenario, DomainError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::invalid_input("Scenario key cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("Scenario name cannot be empty"));
        }

        let scenario = Scenario::new(
            key,
            name,
            system_prompt,
            temperature.unwrap_or(DEFAULT_TEMPERATURE),
        );
        self.scenario_repo.save(scenario.clone()).await?;
        info!("Registered scenario '{}'", key);
        Ok(scenario)
    }
}
