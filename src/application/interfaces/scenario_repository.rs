use async_trait::async_trait;

use crate::domain::{DomainError, Scenario};

/// Keyed storage for scenarios.
#[async_trait]
pub trait ScenarioRepository: Send + Sync {
    /// All scenarios, ordered by key.
    async fn list(&self) -> Result<Vec<Scenario>, DomainError>;

    async fn find_by_key(&self, key: &str) -> Result<Option<Scenario>, DomainError>;

    /// Insert, replacing any scenario with the same key.
    async fn save(&self, scenario: Scenario) -> Result<(), DomainError>;
}
