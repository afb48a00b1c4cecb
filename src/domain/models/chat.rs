use serde::{Deserialize, Serialize};

use super::DEFAULT_SCENARIO;

/// Per-call knobs for a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub scenario: String,
    pub use_history: bool,
    pub temperature: Option<f32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            scenario: DEFAULT_SCENARIO.to_string(),
            use_history: false,
            temperature: None,
        }
    }
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    pub fn with_history(mut self, use_history: bool) -> Self {
        self.use_history = use_history;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A successful completion together with how the request was resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub content: String,
    /// Scenario actually used; differs from the requested key on fallback.
    pub scenario: String,
    pub temperature: f32,
    pub fell_back: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_plain_single_turn_call() {
        let options = ChatOptions::default();
        assert_eq!(options.scenario, "default");
        assert!(!options.use_history);
        assert!(options.temperature.is_none());
    }

    #[test]
    fn builder_sets_fields() {
        let options = ChatOptions::new()
            .with_scenario("teacher")
            .with_history(true)
            .with_temperature(Some(0.2));
        assert_eq!(options.scenario, "teacher");
        assert!(options.use_history);
        assert_eq!(options.temperature, Some(0.2));
    }
}
