use anyhow::Result;

use crate::Commands;

use super::container::Container;
use super::controller::{
    BatchController, ChatController, ModelsController, ScenarioController, StatusController,
};

pub struct Router<'a> {
    chat_controller: ChatController<'a>,
    scenario_controller: ScenarioController<'a>,
    models_controller: ModelsController<'a>,
    status_controller: StatusController<'a>,
    batch_controller: BatchController<'a>,
}

impl<'a> Router<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self {
            chat_controller: ChatController::new(container),
            scenario_controller: ScenarioController::new(container),
            models_controller: ModelsController::new(container),
            status_controller: StatusController::new(container),
            batch_controller: BatchController::new(container),
        }
    }

    pub async fn route(&self, command: Commands) -> Result<String> {
        match command {
            Commands::Ask {
                message,
                scenario,
                temperature,
                stream,
            } => {
                self.chat_controller
                    .ask(message, scenario, temperature, stream)
                    .await
            }
            Commands::Scenarios => self.scenario_controller.list().await,
            Commands::Scenario { key } => self.scenario_controller.show(key).await,
            Commands::Models => self.models_controller.list().await,
            Commands::Status => self.status_controller.status().await,
            Commands::Batch {
                file,
                scenario,
                temperature,
                json,
            } => {
                self.batch_controller
                    .batch(file, scenario, temperature, json)
                    .await
            }
            Commands::Serve { .. } | Commands::Web { .. } | Commands::Shell { .. } => {
                unreachable!("server and shell commands are handled separately in main")
            }
        }
    }
}
