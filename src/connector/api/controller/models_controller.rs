use anyhow::Result;

use super::super::Container;

pub struct ModelsController<'a> {
    container: &'a Container,
}

impl<'a> ModelsController<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub async fn list(&self) -> Result<String> {
        let models = self.container.backend().list_models().await?;
        Ok(self.format_models(&models))
    }

    fn format_models(&self, models: &[String]) -> String {
        if models.is_empty() {
            return "No models installed.".to_string();
        }

        let current = self.container.model_name();
        let mut output = format!("Installed models ({}):\n\n", models.len());
        for model in models {
            let marker = if model == current { "*" } else { " " };
            output.push_str(&format!("{} {}\n", marker, model));
        }
        output
    }
}
