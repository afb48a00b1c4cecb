use anyhow::Result;

use super::super::Container;

pub struct StatusController<'a> {
    container: &'a Container,
}

impl<'a> StatusController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn status(&self) -> Result<String> {
        let reachable = self.container.backend().is_reachable().await;

        Ok(format!(
            "ScenarioChat Status\n===================\nServer:    {}\nModel:     {}\nReachable: {}",
            self.container.base_url(),
            self.container.model_name(),
            if reachable { "yes" } else { "no" }
        ))
    }
}
