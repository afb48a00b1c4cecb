use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ScenarioRepository;
use crate::domain::{builtin_scenarios, DomainError, Scenario};

/// Process-lifetime scenario registry.
pub struct InMemoryScenarioRepository {
    scenarios: RwLock<BTreeMap<String, Scenario>>,
}

impl InMemoryScenarioRepository {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            scenarios: RwLock::new(BTreeMap::new()),
        }
    }

    /// A registry seeded with the built-in scenarios.
    pub fn with_builtins() -> Self {
        let scenarios = builtin_scenarios()
            .into_iter()
            .map(|s| (s.key().to_string(), s))
            .collect();
        Self {
            scenarios: RwLock::new(scenarios),
        }
    }
}

impl Default for InMemoryScenarioRepository {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[async_trait]
impl ScenarioRepository for InMemoryScenarioRepository {
    async fn list(&self) -> Result<Vec<Scenario>, DomainError> {
        Ok(self.scenarios.read().await.values().cloned().collect())
    }

    async fn find_by_key(&self, key: &str) -> Result<Option<Scenario>, DomainError> {
        Ok(self.scenarios.read().await.get(key).cloned())
    }

    async fn save(&self, scenario: Scenario) -> Result<(), DomainError> {
        let key = scenario.key().to_string();
        let replaced = self
            .scenarios
            .write()
            .await
            .insert(key.clone(), scenario)
            .is_some();
        debug!("Saved scenario '{}' (replaced: {})", key, replaced);
        Ok(())
    }
}
