use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scenariochat::cli::shell::Shell;
use scenariochat::connector::http::{rest, web};
use scenariochat::{
    ClientSettings, Commands, Container, ContainerConfig, HistoryWindow, OllamaConfig, Router,
    ScenarioPolicy, SessionLimits,
};

#[derive(Parser)]
#[command(name = "scenariochat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Ollama endpoint (default: $OLLAMA_BASE_URL or http://localhost:11434)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name (default: $OLLAMA_MODEL or deepseek-r1:1.5b)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Model request timeout in seconds
    #[arg(long, global = true, default_value = "60")]
    timeout: u64,

    /// Fail on unknown scenario keys instead of falling back to `default`
    #[arg(long, global = true)]
    strict_scenarios: bool,

    /// Resend only the last N history messages
    #[arg(long, global = true)]
    history_window: Option<usize>,

    /// Drop server sessions idle for longer than this many seconds
    #[arg(long, global = true)]
    session_max_age: Option<i64>,

    /// Keep at most this many server sessions
    #[arg(long, global = true)]
    max_sessions: Option<usize>,

    /// Answer from an in-process echo backend instead of Ollama
    #[arg(long, global = true)]
    mock_backend: bool,

    /// JSON file of additional scenarios
    #[arg(long, global = true)]
    scenarios_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn container_config(&self) -> ContainerConfig {
        let mut ollama = OllamaConfig::from_env();
        if let Some(base_url) = &self.base_url {
            ollama.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(model) = &self.model {
            ollama.model = model.clone();
        }
        ollama.timeout = Duration::from_secs(self.timeout);

        ContainerConfig {
            ollama,
            mock_backend: self.mock_backend,
            client: ClientSettings {
                scenario_policy: if self.strict_scenarios {
                    ScenarioPolicy::Strict
                } else {
                    ScenarioPolicy::Fallback
                },
                history_window: HistoryWindow::from_limit(self.history_window),
            },
            session_limits: SessionLimits {
                max_idle_secs: self.session_max_age,
                max_sessions: self.max_sessions,
            },
            scenarios_file: self.scenarios_file.clone(),
        }
    }
}

fn bind_addr(port: u16, public: bool) -> SocketAddr {
    let ip = if public {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    };
    SocketAddr::new(ip, port)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let container = Container::new(cli.container_config()).await?;

    match cli.command {
        Commands::Serve { port, public } => {
            rest::serve(Arc::new(container), bind_addr(port, public)).await?;
        }
        Commands::Web { port, public } => {
            web::serve(Arc::new(container), bind_addr(port, public)).await?;
        }
        Commands::Shell { scenario, history } => {
            let shell = Shell::new(
                container.new_client(),
                container.scenarios_use_case(),
                scenario,
                history,
            );
            shell.run().await?;
        }
        command => {
            let router = Router::new(&container);
            let output = router.route(command).await?;
            if !output.is_empty() {
                println!("{}", output);
            }
        }
    }

    Ok(())
}
