use anyhow::{bail, Result};

use crate::{Scenario, ScenarioSummary};

use super::super::Container;

pub struct ScenarioController<'a> {
    container: &'a Container,
}

impl<'a> ScenarioController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let scenarios = self.container.scenarios_use_case().list().await?;
        Ok(self.format_scenario_list(&scenarios))
    }

    pub async fn show(&self, key: String) -> Result<String> {
        match self.container.scenarios_use_case().get(&key).await? {
            Some(scenario) => Ok(self.format_scenario(&scenario)),
            None => bail!("Scenario not found: {}", key),
        }
    }

    fn format_scenario_list(&self, scenarios: &[ScenarioSummary]) -> String {
        if scenarios.is_empty() {
            return "No scenarios registered.".to_string();
        }

        let mut output = format!("Available scenarios ({}):\n\n", scenarios.len());
        for s in scenarios {
            output.push_str(&format!(
                "  {:<20} {} (temperature {})\n",
                s.key, s.name, s.temperature
            ));
        }
        output
    }

    fn format_scenario(&self, scenario: &Scenario) -> String {
        format!(
            "{} ({})\nTemperature: {}\n\n{}",
            scenario.name(),
            scenario.key(),
            scenario.temperature(),
            scenario.system_prompt()
        )
    }
}
