use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::debug;

use crate::application::{InferenceClient, ManageScenariosUseCase};
use crate::domain::ChatOptions;

const DEFAULT_EXPORT_FILE: &str = "conversation.json";

const MENU: &str = "\
Commands:
  chat            start chatting (type 'exit' to come back)
  scenarios       list scenarios
  switch <key>    change scenario (clears history)
  history on|off  toggle conversation history
  clear           clear conversation history
  export [file]   write history to a JSON file (default: conversation.json)
  import <file>   load history from a JSON file
  models          list installed models
  help            show this menu
  quit            leave";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    Menu,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellAction {
    Continue,
    Quit,
}

/// Menu-driven chat loop over a single inference client.
///
/// Input handling lives in [`Shell::handle_line`] so it can be driven without
/// a terminal; [`Shell::run`] only adds line editing around it.
pub struct Shell {
    client: InferenceClient,
    scenarios: ManageScenariosUseCase,
    scenario: String,
    use_history: bool,
    mode: ShellMode,
}

impl Shell {
    pub fn new(
        client: InferenceClient,
        scenarios: ManageScenariosUseCase,
        scenario: impl Into<String>,
        use_history: bool,
    ) -> Self {
        Self {
            client,
            scenarios,
            scenario: scenario.into(),
            use_history,
            mode: ShellMode::Menu,
        }
    }

    pub fn mode(&self) -> ShellMode {
        self.mode
    }

    pub fn scenario(&self) -> &str {
        &self.scenario
    }

    pub fn use_history(&self) -> bool {
        self.use_history
    }

    pub fn client(&self) -> &InferenceClient {
        &self.client
    }

    pub fn prompt(&self) -> &'static str {
        match self.mode {
            ShellMode::Menu => "> ",
            ShellMode::Chat => "you> ",
        }
    }

    /// Process one line of input and return what to print.
    pub async fn handle_line(&mut self, line: &str) -> (ShellAction, String) {
        let line = line.trim();
        match self.mode {
            ShellMode::Menu => self.handle_command(line).await,
            ShellMode::Chat => (ShellAction::Continue, self.handle_chat(line).await),
        }
    }

    async fn handle_command(&mut self, line: &str) -> (ShellAction, String) {
        let mut parts = line.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();

        let output = match (command.as_str(), argument) {
            ("", _) => String::new(),
            ("quit" | "exit", _) => return (ShellAction::Quit, "Goodbye!".to_string()),
            ("help", _) => MENU.to_string(),
            ("chat", _) => self.enter_chat().await,
            ("scenarios", _) => self.list_scenarios().await,
            ("switch", Some(key)) => self.switch_scenario(key).await,
            ("switch", None) => format!("{}\nUsage: switch <key>", self.list_scenarios().await),
            ("history", Some("on")) => {
                self.use_history = true;
                "Conversation history ON".to_string()
            }
            ("history", Some("off")) => {
                self.use_history = false;
                "Conversation history OFF".to_string()
            }
            ("history", _) => "Usage: history on|off".to_string(),
            ("clear", _) => {
                self.client.clear_history().await;
                "Conversation history cleared".to_string()
            }
            ("export", file) => {
                let file = file.unwrap_or(DEFAULT_EXPORT_FILE);
                match self.client.export_history(file).await {
                    Ok(path) => format!("Conversation exported to {}", path.display()),
                    Err(e) => format!("Error: {}", e),
                }
            }
            ("import", Some(file)) => match self.client.import_history(file).await {
                Ok(count) => format!("Loaded {} messages from {}", count, file),
                Err(e) => format!("Error: {}", e),
            },
            ("import", None) => "Usage: import <file>".to_string(),
            ("models", _) => self.list_models().await,
            (other, _) => format!("Unknown command: {} (type 'help')", other),
        };

        (ShellAction::Continue, output)
    }

    async fn handle_chat(&mut self, line: &str) -> String {
        if line.eq_ignore_ascii_case("exit") {
            self.mode = ShellMode::Menu;
            return "Back to menu".to_string();
        }
        if line.is_empty() {
            return String::new();
        }

        let options = ChatOptions::new()
            .with_scenario(self.scenario.clone())
            .with_history(self.use_history);

        match self.client.chat(line, &options).await {
            Ok(reply) => format!("AI: {}", reply.content),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn enter_chat(&mut self) -> String {
        self.mode = ShellMode::Chat;
        let name = match self.scenarios.get(&self.scenario).await {
            Ok(Some(scenario)) => scenario.name().to_string(),
            _ => self.scenario.clone(),
        };
        format!(
            "Chat mode\nScenario: {}\nHistory: {}\nType 'exit' to return to the menu",
            name,
            if self.use_history { "ON" } else { "OFF" }
        )
    }

    async fn list_scenarios(&self) -> String {
        match self.scenarios.list().await {
            Ok(scenarios) => {
                let mut output = String::from("Scenarios:\n");
                for s in scenarios {
                    let marker = if s.key == self.scenario { "*" } else { " " };
                    output.push_str(&format!(
                        "{} {:<20} {} (temperature {})\n",
                        marker, s.key, s.name, s.temperature
                    ));
                }
                output.trim_end().to_string()
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn switch_scenario(&mut self, key: &str) -> String {
        match self.scenarios.get(key).await {
            Ok(Some(scenario)) => {
                self.scenario = scenario.key().to_string();
                self.client.clear_history().await;
                format!(
                    "Switched to scenario: {}\nConversation history cleared",
                    scenario.name()
                )
            }
            Ok(None) => format!("Scenario not found: {}", key),
            Err(e) => format!("Error: {}", e),
        }
    }

    async fn list_models(&self) -> String {
        let models = self.client.list_models().await;
        if models.is_empty() {
            return "No models found, or the inference server is not running".to_string();
        }

        let mut output = String::from("Installed models:\n");
        for model in models {
            let marker = if model == self.client.model_name() {
                "*"
            } else {
                " "
            };
            output.push_str(&format!("{} {}\n", marker, model));
        }
        output.trim_end().to_string()
    }

    /// Run the interactive loop until `quit` or end of input.
    pub async fn run(mut self) -> Result<()> {
        println!("Checking inference server...");
        if !self.client.is_reachable().await {
            println!("Cannot reach the inference server.");
            println!("  1. Install Ollama: https://ollama.com/download");
            println!("  2. Start it:       ollama serve");
            println!("  3. Pull a model:   ollama pull {}", self.client.model_name());
            return Ok(());
        }
        println!("Connected.\n");
        println!("{}", MENU);

        let mut editor = DefaultEditor::new()?;
        loop {
            let prompt = self.prompt();
            let line = match tokio::task::block_in_place(|| editor.readline(prompt)) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };
            if !line.trim().is_empty() {
                let _ = editor.add_history_entry(line.as_str());
            }

            let (action, output) = self.handle_line(&line).await;
            if !output.is_empty() {
                println!("{}", output);
            }
            if action == ShellAction::Quit {
                break;
            }
        }

        debug!("Shell closed");
        Ok(())
    }
}
